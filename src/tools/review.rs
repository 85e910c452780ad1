use std::path::PathBuf;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::error::{ToolError, ValidationError};
use crate::review::{MarkdownReviewRequest, WriteResult, write_review};
use crate::tools::Tool;

/// Saves the finished review as a markdown file.
pub struct WriteReviewToMarkdown;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WriteReviewInput {
    /// Directory to write into. Created if missing.
    pub output_dir: PathBuf,
    /// File name; `.md` is appended when absent.
    pub filename: String,
    /// Markdown body of the review.
    pub content: String,
    /// Replace an existing file. When false, a timestamped name is used instead.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,
}

fn default_overwrite() -> bool {
    true
}

impl TryFrom<&WriteReviewInput> for MarkdownReviewRequest {
    type Error = ValidationError;

    fn try_from(input: &WriteReviewInput) -> Result<Self, Self::Error> {
        MarkdownReviewRequest::new(
            input.output_dir.clone(),
            input.filename.clone(),
            input.content.clone(),
            input.overwrite,
        )
    }
}

#[async_trait]
impl Tool for WriteReviewToMarkdown {
    const NAME: &'static str = "write-review-to-markdown";
    const DESCRIPTION: &'static str = "Write review content to a markdown file. Returns the path \
        written, the byte count and whether an existing file was replaced.";

    type Input = WriteReviewInput;
    type Output = WriteResult;

    fn validate(&self, input: &WriteReviewInput) -> Result<(), ValidationError> {
        MarkdownReviewRequest::try_from(input).map(drop)
    }

    async fn call(&self, input: WriteReviewInput) -> Result<WriteResult, ToolError> {
        let request = MarkdownReviewRequest::try_from(&input)?;
        Ok(tokio::task::spawn_blocking(move || write_review(&request)).await??)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_overwrite_defaults_to_true() {
        let input: WriteReviewInput = serde_json::from_value(json!({
            "outputDir": "reviews",
            "filename": "review",
            "content": "# Review"
        }))
        .unwrap();
        assert!(input.overwrite);
    }

    #[test]
    fn test_empty_content_is_rejected() {
        let input: WriteReviewInput = serde_json::from_value(json!({
            "outputDir": "reviews",
            "filename": "review",
            "content": ""
        }))
        .unwrap();
        assert_eq!(
            WriteReviewToMarkdown.validate(&input),
            Err(ValidationError::Empty { field: "content" })
        );
    }

    #[tokio::test]
    async fn test_call_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = WriteReviewInput {
            output_dir: dir.path().join("out"),
            filename: "review".to_string(),
            content: "# Review\n".to_string(),
            overwrite: true,
        };

        let result = WriteReviewToMarkdown.call(input).await.unwrap();
        assert!(result.path.ends_with("out/review.md"));
        assert_eq!(result.bytes, 9);
        assert!(result.overwritten);
    }
}
