//! Codex CLI provider.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::CodexError;
use crate::llm::process::output_with_stdin;
use crate::llm::retry::retry_with_backoff;

/// Default timeout for Codex subprocess execution (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable to override the default timeout.
const TIMEOUT_ENV_VAR: &str = "DIFFWISE_CODEX_TIMEOUT";

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

/// Check if Codex CLI is installed and runs.
pub async fn check_codex_installed() -> Result<(), CodexError> {
    if which::which("codex").is_err() {
        return Err(CodexError::NotInstalled);
    }

    let version_check = Command::new("codex")
        .arg("--version")
        .output()
        .await
        .map_err(CodexError::SpawnFailed)?;

    if !version_check.status.success() {
        return Err(CodexError::NotInstalled);
    }

    Ok(())
}

/// Run `codex exec -` with the prompt on stdin and return the agent's last message.
///
/// The last message is captured through `--output-last-message` into a temp
/// file, since stdout also carries Codex's progress log. Falls back to stdout
/// when the file is left empty.
pub async fn run_codex(prompt: &str) -> Result<String, CodexError> {
    let timeout_duration = get_timeout();
    let timeout_secs = timeout_duration.as_secs();

    let last_message = NamedTempFile::new().map_err(|e| {
        CodexError::ExecutionFailed(format!("Failed to create output file: {}", e))
    })?;

    let mut cmd = Command::new("codex");
    cmd.arg("exec")
        .arg("--output-last-message")
        .arg(last_message.path())
        .arg("-");

    let output = timeout(timeout_duration, output_with_stdin(&mut cmd, prompt))
        .await
        .map_err(|_| CodexError::Timeout(timeout_secs))?
        .map_err(CodexError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(CodexError::NonZeroExit { code, stderr });
    }

    let message = std::fs::read_to_string(last_message.path()).map_err(|e| {
        CodexError::ExecutionFailed(format!("Failed to read output file: {}", e))
    })?;

    if message.trim().is_empty() {
        debug!("Codex left no last message, using stdout");
        return Ok(String::from_utf8_lossy(&output.stdout).to_string());
    }
    Ok(message)
}

/// Runs one Codex completion. Mockable in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CodexExecutor: Send + Sync {
    async fn run(&self, prompt: &str) -> Result<String, CodexError>;
}

/// Executor that calls the real Codex CLI.
pub struct DefaultExecutor;

#[async_trait]
impl CodexExecutor for DefaultExecutor {
    async fn run(&self, prompt: &str) -> Result<String, CodexError> {
        run_codex(prompt).await
    }
}

/// Complete `prompt` with up to 3 attempts.
pub async fn generate_with_retry(prompt: &str) -> Result<String, CodexError> {
    generate_with_retry_impl(prompt, &DefaultExecutor).await
}

pub(crate) async fn generate_with_retry_impl<E: CodexExecutor>(
    prompt: &str,
    executor: &E,
) -> Result<String, CodexError> {
    retry_with_backoff(
        || async move {
            let reply = executor.run(prompt).await?;
            if reply.trim().is_empty() {
                return Err(CodexError::ExecutionFailed("empty reply".to_string()));
            }
            Ok(reply)
        },
        |e| CodexError::RetriesExhausted(Box::new(e)),
    )
    .await
}
