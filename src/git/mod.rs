//! Git operations using git2-rs.

pub mod changes;

pub use changes::{
    ChangedFile, DiffMode, EXCLUDED_FILES, changed_paths, get_changes, is_excluded,
    open_repository, status_paths,
};
