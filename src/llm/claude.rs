//! Claude CLI provider.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::ClaudeError;
use crate::llm::process::output_with_stdin;
use crate::llm::retry::retry_with_backoff;

/// Default timeout for Claude subprocess execution (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "DIFFWISE_CLAUDE_TIMEOUT";

/// Reads `DIFFWISE_CLAUDE_TIMEOUT` (seconds), falling back to 300.
fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) => Duration::from_secs(secs),
            Err(_) => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}

/// Check if Claude Code CLI is installed and runs.
pub async fn check_claude_installed() -> Result<(), ClaudeError> {
    if which::which("claude").is_err() {
        return Err(ClaudeError::NotInstalled);
    }

    let version_check = Command::new("claude")
        .arg("--version")
        .output()
        .await
        .map_err(ClaudeError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(ClaudeError::NotInstalled);
    }

    Ok(())
}

/// Run `claude -p --output-format json` with the prompt on stdin and return stdout.
pub async fn run_claude(prompt: &str) -> Result<String, ClaudeError> {
    let timeout_duration = get_timeout();
    let timeout_secs = timeout_duration.as_secs();

    let mut cmd = Command::new("claude");
    cmd.arg("-p").arg("--output-format").arg("json");

    let output = timeout(timeout_duration, output_with_stdin(&mut cmd, prompt))
        .await
        .map_err(|_| ClaudeError::Timeout(timeout_secs))?
        .map_err(ClaudeError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ClaudeError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Runs one Claude completion. Mockable in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaudeExecutor: Send + Sync {
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError>;
}

/// Executor that calls the real Claude CLI.
pub struct DefaultExecutor;

#[async_trait]
impl ClaudeExecutor for DefaultExecutor {
    async fn run(&self, prompt: &str) -> Result<String, ClaudeError> {
        run_claude(prompt).await
    }
}

/// Complete `prompt` with up to 3 attempts, returning the reply text.
pub async fn generate_with_retry(prompt: &str) -> Result<String, ClaudeError> {
    generate_with_retry_impl(prompt, &DefaultExecutor).await
}

pub(crate) async fn generate_with_retry_impl<E: ClaudeExecutor>(
    prompt: &str,
    executor: &E,
) -> Result<String, ClaudeError> {
    retry_with_backoff(
        || async move {
            let raw = executor.run(prompt).await?;
            parse_claude_response(&raw)
        },
        |e| ClaudeError::RetriesExhausted(Box::new(e)),
    )
    .await
}

/// Claude CLI JSON envelope when using --output-format json
#[derive(Deserialize)]
struct ClaudeCliResponse {
    result: String,
    #[serde(default)]
    is_error: bool,
}

/// Unwrap the CLI envelope; plain text output is passed through.
fn parse_claude_response(response: &str) -> Result<String, ClaudeError> {
    match serde_json::from_str::<ClaudeCliResponse>(response) {
        Ok(envelope) if envelope.is_error => Err(ClaudeError::ExecutionFailed(envelope.result)),
        Ok(envelope) => Ok(envelope.result),
        Err(e) => {
            debug!("Claude output is not a JSON envelope ({}), using raw text", e);
            Ok(response.to_string())
        }
    }
}
