use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::{ToolError, ValidationError};
use crate::git::{ChangedFile, get_changes};
use crate::tools::Tool;

/// Lists every changed file in the working tree with its unified diff.
pub struct GetFileChanges;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileChangesInput {
    /// Path inside the git repository to inspect.
    pub root_dir: PathBuf,
}

#[async_trait]
impl Tool for GetFileChanges {
    const NAME: &'static str = "get-file-changes";
    const DESCRIPTION: &'static str = "List the files changed in the working tree (staged and \
        unstaged, relative to HEAD) together with each file's unified diff.";

    type Input = FileChangesInput;
    type Output = Vec<ChangedFile>;

    fn validate(&self, input: &FileChangesInput) -> Result<(), ValidationError> {
        if input.root_dir.as_os_str().is_empty() {
            return Err(ValidationError::Empty { field: "rootDir" });
        }
        Ok(())
    }

    async fn call(&self, input: FileChangesInput) -> Result<Vec<ChangedFile>, ToolError> {
        let root_dir = input.root_dir;
        Ok(tokio::task::spawn_blocking(move || get_changes(&root_dir)).await??)
    }
}
