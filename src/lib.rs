//! diffwise - An LLM agent that reviews local git changes.
//!
//! # Overview
//!
//! diffwise gives a model three tools: list the working tree's changed files
//! with their diffs, suggest a commit message from the changed paths, and save
//! a review as markdown. The agent session drives the model for a bounded
//! number of steps and streams its output.

pub mod agent;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod logging;
pub mod review;
pub mod tools;

// Re-export commonly used types
pub use agent::{AgentSession, SessionOutcome};
pub use commit::{CommitMessageRequest, CommitType, Convention, SuggestedCommitMessage};
pub use error::{AgentError, FilesystemError, ToolError, ValidationError, VcsError};
pub use git::{ChangedFile, DiffMode};
pub use llm::{LlmRouter, ModelClient, Provider};
pub use review::{MarkdownReviewRequest, WriteResult};
pub use tools::{Tool, ToolDefinition, ToolRegistry};
