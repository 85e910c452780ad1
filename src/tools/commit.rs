use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::commit::{
    CommitMessageRequest, Convention, DEFAULT_SUBJECT_LENGTH, SuggestedCommitMessage, compose,
};
use crate::error::{ToolError, ValidationError};
use crate::git::DiffMode;
use crate::tools::Tool;

/// Suggests a commit message from the changed file list.
pub struct GenerateCommitMessage;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitMessageInput {
    /// Path inside the git repository.
    pub root_dir: PathBuf,
    /// Which diff to describe.
    #[serde(default)]
    pub mode: DiffMode,
    #[serde(default)]
    pub convention: Convention,
    /// Longest allowed subject line, in characters.
    #[serde(default = "default_max_subject_length")]
    #[schemars(range(min = 20, max = 100))]
    pub max_subject_length: i64,
}

fn default_max_subject_length() -> i64 {
    DEFAULT_SUBJECT_LENGTH
}

impl TryFrom<&CommitMessageInput> for CommitMessageRequest {
    type Error = ValidationError;

    fn try_from(input: &CommitMessageInput) -> Result<Self, Self::Error> {
        CommitMessageRequest::new(
            input.root_dir.clone(),
            input.mode,
            input.convention,
            input.max_subject_length,
        )
    }
}

#[async_trait]
impl Tool for GenerateCommitMessage {
    const NAME: &'static str = "generate-commit-message";
    const DESCRIPTION: &'static str = "Suggest a commit message (type, scope, subject and body) \
        for the current staged or unstaged changes.";

    type Input = CommitMessageInput;
    type Output = SuggestedCommitMessage;

    fn validate(&self, input: &CommitMessageInput) -> Result<(), ValidationError> {
        CommitMessageRequest::try_from(input).map(drop)
    }

    async fn call(&self, input: CommitMessageInput) -> Result<SuggestedCommitMessage, ToolError> {
        let request = CommitMessageRequest::try_from(&input)?;
        Ok(tokio::task::spawn_blocking(move || compose(&request)).await??)
    }
}
