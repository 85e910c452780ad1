//! Heuristic commit message suggestions built from the changed file list.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commit::classify::{CommitType, classify, infer_scope};
use crate::error::{ValidationError, VcsError};
use crate::git::{DiffMode, changed_paths, open_repository, status_paths};

pub const MIN_SUBJECT_LENGTH: i64 = 20;
pub const MAX_SUBJECT_LENGTH: i64 = 100;
pub const DEFAULT_SUBJECT_LENGTH: i64 = 72;

/// Files listed by name in the summary before collapsing into "and N more".
const SUMMARY_FILE_LIMIT: usize = 3;

const ELLIPSIS: char = '…';

/// Subject line style.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Convention {
    /// `type(scope): summary`
    #[default]
    Conventional,
    /// The summary alone.
    Plain,
}

/// A validated request for a commit message suggestion.
#[derive(Debug, Clone)]
pub struct CommitMessageRequest {
    root_dir: PathBuf,
    mode: DiffMode,
    convention: Convention,
    max_subject_length: usize,
}

impl CommitMessageRequest {
    pub fn new(
        root_dir: impl Into<PathBuf>,
        mode: DiffMode,
        convention: Convention,
        max_subject_length: i64,
    ) -> Result<Self, ValidationError> {
        let root_dir = root_dir.into();
        if root_dir.as_os_str().is_empty() {
            return Err(ValidationError::Empty { field: "rootDir" });
        }
        if !(MIN_SUBJECT_LENGTH..=MAX_SUBJECT_LENGTH).contains(&max_subject_length) {
            return Err(ValidationError::OutOfRange {
                field: "maxSubjectLength",
                value: max_subject_length,
                min: MIN_SUBJECT_LENGTH,
                max: MAX_SUBJECT_LENGTH,
            });
        }

        Ok(Self {
            root_dir,
            mode,
            convention,
            max_subject_length: max_subject_length as usize,
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn mode(&self) -> DiffMode {
        self.mode
    }

    pub fn convention(&self) -> Convention {
        self.convention
    }

    pub fn max_subject_length(&self) -> usize {
        self.max_subject_length
    }
}

/// A suggested commit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestedCommitMessage {
    pub subject: String,
    pub body: Option<String>,
    #[serde(rename = "type")]
    pub commit_type: CommitType,
    pub scope: Option<String>,
    pub files: Vec<String>,
}

/// Suggest a commit message for the repository's current changes.
///
/// Uses the diff for the requested mode. When the diff is empty (only
/// untracked or renamed files, say) falls back to the paths reported by
/// `git status`.
pub fn compose(request: &CommitMessageRequest) -> Result<SuggestedCommitMessage, VcsError> {
    let repo = open_repository(request.root_dir())?;

    let mut files = changed_paths(&repo, request.mode())?;
    if files.is_empty() {
        debug!("Diff for {:?} is empty, falling back to status", request.mode());
        files = status_paths(&repo)?;
    }

    Ok(suggest(
        files,
        request.convention(),
        request.max_subject_length(),
    ))
}

/// Build the suggestion from an already collected file list.
pub fn suggest(
    files: Vec<String>,
    convention: Convention,
    max_subject_length: usize,
) -> SuggestedCommitMessage {
    let scope = infer_scope(&files);
    let commit_type = classify(&files);
    let summary = summary_line(&files);
    let subject = format_subject(
        commit_type,
        scope.as_deref(),
        &summary,
        max_subject_length,
        convention,
    );
    let body = build_body(&files);

    SuggestedCommitMessage {
        subject,
        body: Some(body),
        commit_type,
        scope,
        files,
    }
}

/// `update a/b.rs, c/d.rs and 2 more files`, or `update repository` when empty.
pub fn summary_line(files: &[String]) -> String {
    if files.is_empty() {
        return "update repository".to_string();
    }

    let shown = files
        .iter()
        .take(SUMMARY_FILE_LIMIT)
        .map(|f| short_path(f))
        .collect::<Vec<_>>()
        .join(", ");

    let hidden = files.len().saturating_sub(SUMMARY_FILE_LIMIT);
    let more = match hidden {
        0 => String::new(),
        1 => " and 1 more file".to_string(),
        n => format!(" and {} more files", n),
    };

    format!("update {}{}", shown, more)
}

/// Last two path segments.
fn short_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    let start = segments.len().saturating_sub(2);
    segments[start..].join("/")
}

/// Render the subject line, truncating with an ellipsis to `max_len` characters.
pub fn format_subject(
    commit_type: CommitType,
    scope: Option<&str>,
    summary: &str,
    max_len: usize,
    convention: Convention,
) -> String {
    let subject = match (convention, scope) {
        (Convention::Conventional, Some(scope)) => {
            format!("{}({}): {}", commit_type, scope, summary)
        }
        (Convention::Conventional, None) => format!("{}: {}", commit_type, summary),
        (Convention::Plain, _) => summary.to_string(),
    };

    if subject.chars().count() <= max_len {
        return subject;
    }

    let mut truncated: String = subject.chars().take(max_len.saturating_sub(1)).collect();
    truncated.push(ELLIPSIS);
    truncated
}

fn build_body(files: &[String]) -> String {
    std::iter::once("Changes:".to_string())
        .chain(files.iter().map(|f| format!("- {}", f)))
        .collect::<Vec<_>>()
        .join("\n")
}
