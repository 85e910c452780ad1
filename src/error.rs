//! Error types for diffwise modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

use crate::llm::LlmError;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Failed to open repository at {path}: {source}")]
    OpenRepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to read repository status: {0}")]
    StatusFailed(#[source] git2::Error),

    #[error("Failed to render patch for '{path}': {source}")]
    PatchFailed {
        path: String,
        #[source]
        source: git2::Error,
    },
}

/// Errors from writing review files.
#[derive(Error, Debug)]
pub enum FilesystemError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to resolve path {path}: {source}")]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Malformed tool input.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("'{field}' must not be empty")]
    Empty { field: &'static str },

    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Invalid input for {tool} at '{path}': {message}")]
    InvalidInput {
        tool: String,
        path: String,
        message: String,
    },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Any failure surfaced by a tool call.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to serialize tool output: {0}")]
    Output(#[source] serde_json::Error),

    #[error("Tool task did not complete: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ClaudeError>),
}

/// Errors from Codex CLI operations.
#[derive(Error, Debug)]
pub enum CodexError {
    #[error(
        "Codex CLI not found. Install with: npm install -g @openai/codex (then run `codex` or set CODEX_API_KEY)"
    )]
    NotInstalled,

    #[error("Codex CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Codex process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Codex process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Codex CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<CodexError>),
}

/// Errors that end an agent session.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("Output stream closed before the session finished")]
    OutputClosed,
}
