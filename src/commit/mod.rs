//! Commit type inference and commit message suggestions.

pub mod classify;
pub mod message;

pub use classify::{CommitType, classify, infer_scope, top_level_segment};
pub use message::{
    CommitMessageRequest, Convention, DEFAULT_SUBJECT_LENGTH, MAX_SUBJECT_LENGTH,
    MIN_SUBJECT_LENGTH, SuggestedCommitMessage, compose, format_subject, suggest, summary_line,
};
