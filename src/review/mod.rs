//! Markdown review persistence.

pub mod writer;

pub use writer::{
    MarkdownReviewRequest, WriteResult, normalize_filename, timestamp_suffix, write_review,
};
