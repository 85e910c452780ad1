//! Provider selection and fallback orchestration.

use std::fmt;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{ClaudeError, CodexError};
use crate::llm::{claude, codex};

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Provider {
    Claude,
    Codex,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Claude => "Claude",
            Provider::Codex => "Codex",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary + fallback selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSelection {
    pub primary: Provider,
    pub fallback: Provider,
}

impl ProviderSelection {
    pub fn from_primary(primary: Provider) -> Self {
        let fallback = match primary {
            Provider::Claude => Provider::Codex,
            Provider::Codex => Provider::Claude,
        };
        Self { primary, fallback }
    }
}

impl Default for ProviderSelection {
    fn default() -> Self {
        ProviderSelection::from_primary(Provider::Claude)
    }
}

/// Provider-specific error wrapper.
#[derive(Debug)]
pub enum LlmProviderError {
    Claude(ClaudeError),
    Codex(CodexError),
}

impl LlmProviderError {
    pub fn summary(&self) -> String {
        match self {
            LlmProviderError::Claude(err) => summarize_claude_error(err),
            LlmProviderError::Codex(err) => summarize_codex_error(err),
        }
    }

    pub fn detail(&self) -> String {
        match self {
            LlmProviderError::Claude(err) => err.to_string(),
            LlmProviderError::Codex(err) => err.to_string(),
        }
    }
}

impl fmt::Display for LlmProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for LlmProviderError {}

impl From<ClaudeError> for LlmProviderError {
    fn from(err: ClaudeError) -> Self {
        LlmProviderError::Claude(err)
    }
}

impl From<CodexError> for LlmProviderError {
    fn from(err: CodexError) -> Self {
        LlmProviderError::Codex(err)
    }
}

/// Both providers failed for the same prompt.
#[derive(Debug)]
pub struct LlmError {
    pub primary: Provider,
    pub primary_error: LlmProviderError,
    pub fallback: Provider,
    pub fallback_error: LlmProviderError,
}

impl LlmError {
    pub fn summary(&self) -> String {
        format!(
            "Both LLM providers failed. {} error: {}. {} error: {}.",
            self.primary,
            self.primary_error.summary(),
            self.fallback,
            self.fallback_error.summary()
        )
    }

    pub fn detailed(&self) -> String {
        format!(
            "Both LLM providers failed. {} error: {}. {} error: {}.",
            self.primary,
            self.primary_error.detail(),
            self.fallback,
            self.fallback_error.detail()
        )
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

impl std::error::Error for LlmError {}

/// The model seen by an agent session: prompt in, reply text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelClient: Send {
    async fn complete(&mut self, prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
trait ProviderRunner: Send + Sync {
    async fn run(&self, provider: Provider, prompt: &str) -> Result<String, LlmProviderError>;
}

struct DefaultRunner;

#[async_trait]
impl ProviderRunner for DefaultRunner {
    async fn run(&self, provider: Provider, prompt: &str) -> Result<String, LlmProviderError> {
        match provider {
            Provider::Claude => claude::generate_with_retry(prompt)
                .await
                .map_err(LlmProviderError::from),
            Provider::Codex => codex::generate_with_retry(prompt)
                .await
                .map_err(LlmProviderError::from),
        }
    }
}

/// Check that a provider's CLI is available.
pub async fn check_provider_installed(provider: Provider) -> Result<(), LlmProviderError> {
    match provider {
        Provider::Claude => claude::check_claude_installed().await.map_err(Into::into),
        Provider::Codex => codex::check_codex_installed().await.map_err(Into::into),
    }
}

/// Provider router with fallback and stickiness.
pub struct LlmRouter {
    primary: Provider,
    fallback: Provider,
}

impl LlmRouter {
    pub fn new(selection: ProviderSelection) -> Self {
        Self {
            primary: selection.primary,
            fallback: selection.fallback,
        }
    }

    pub fn primary(&self) -> Provider {
        self.primary
    }

    pub fn fallback(&self) -> Provider {
        self.fallback
    }

    pub async fn generate(&mut self, prompt: &str) -> Result<String, LlmError> {
        self.generate_with_runner(prompt, &DefaultRunner).await
    }

    /// Try the primary, then the fallback. A fallback success swaps the two
    /// so later calls go straight to the provider that works.
    async fn generate_with_runner<R: ProviderRunner>(
        &mut self,
        prompt: &str,
        runner: &R,
    ) -> Result<String, LlmError> {
        let primary = self.primary;
        let fallback = self.fallback;

        let primary_error = match runner.run(primary, prompt).await {
            Ok(output) => return Ok(output),
            Err(e) => e,
        };

        warn!("{} failed ({}), trying {}", primary, primary_error, fallback);

        match runner.run(fallback, prompt).await {
            Ok(output) => {
                info!("Switching to {} for the rest of the session", fallback);
                self.primary = fallback;
                self.fallback = primary;
                Ok(output)
            }
            Err(fallback_error) => Err(LlmError {
                primary,
                primary_error,
                fallback,
                fallback_error,
            }),
        }
    }
}

#[async_trait]
impl ModelClient for LlmRouter {
    async fn complete(&mut self, prompt: &str) -> Result<String, LlmError> {
        self.generate(prompt).await
    }
}

fn summarize_claude_error(err: &ClaudeError) -> String {
    match err {
        ClaudeError::NotInstalled => "Claude CLI not found".to_string(),
        ClaudeError::ExecutionFailed(_) => "Claude CLI reported an error".to_string(),
        ClaudeError::SpawnFailed(_) => "Failed to start Claude CLI".to_string(),
        ClaudeError::Timeout(secs) => format!("Claude timed out after {}s", secs),
        ClaudeError::NonZeroExit { code, .. } => format!("Claude CLI exited with code {}", code),
        ClaudeError::RetriesExhausted(_) => "Claude failed after retries".to_string(),
    }
}

fn summarize_codex_error(err: &CodexError) -> String {
    match err {
        CodexError::NotInstalled => "Codex CLI not found".to_string(),
        CodexError::ExecutionFailed(_) => "Codex CLI reported an error".to_string(),
        CodexError::SpawnFailed(_) => "Failed to start Codex CLI".to_string(),
        CodexError::Timeout(secs) => format!("Codex timed out after {}s", secs),
        CodexError::NonZeroExit { code, .. } => format!("Codex CLI exited with code {}", code),
        CodexError::RetriesExhausted(_) => "Codex failed after retries".to_string(),
    }
}
