//! Persist review markdown to disk.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use path_absolutize::Absolutize;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{FilesystemError, ValidationError};

const MARKDOWN_SUFFIX: &str = ".md";

/// A validated request to write a review file.
#[derive(Debug, Clone)]
pub struct MarkdownReviewRequest {
    output_dir: PathBuf,
    filename: String,
    content: String,
    overwrite: bool,
}

impl MarkdownReviewRequest {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        filename: impl Into<String>,
        content: impl Into<String>,
        overwrite: bool,
    ) -> Result<Self, ValidationError> {
        let output_dir = output_dir.into();
        let filename = filename.into();
        let content = content.into();

        if output_dir.as_os_str().is_empty() {
            return Err(ValidationError::Empty { field: "outputDir" });
        }
        if filename.is_empty() {
            return Err(ValidationError::Empty { field: "filename" });
        }
        if content.is_empty() {
            return Err(ValidationError::Empty { field: "content" });
        }

        Ok(Self {
            output_dir,
            filename,
            content,
            overwrite,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }
}

/// Outcome of a review write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteResult {
    /// Absolute path of the file actually written.
    pub path: PathBuf,
    pub bytes: usize,
    pub overwritten: bool,
}

/// Append `.md` unless the name already ends with it.
pub fn normalize_filename(filename: &str) -> String {
    if filename.ends_with(MARKDOWN_SUFFIX) {
        filename.to_string()
    } else {
        format!("{}{}", filename, MARKDOWN_SUFFIX)
    }
}

/// `YYYYMMDDHHMMSS`
pub fn timestamp_suffix(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// Write the review.
///
/// With `overwrite` set, any existing file is replaced. Otherwise the file is
/// created exclusively; if it already exists the review goes to
/// `<name>.<timestamp>.md` instead.
pub fn write_review(request: &MarkdownReviewRequest) -> Result<WriteResult, FilesystemError> {
    write_review_at(request, Utc::now())
}

fn write_review_at(
    request: &MarkdownReviewRequest,
    now: DateTime<Utc>,
) -> Result<WriteResult, FilesystemError> {
    let filename = normalize_filename(request.filename());
    let joined = request.output_dir().join(&filename);
    let path = joined
        .absolutize()
        .map_err(|source| FilesystemError::ResolvePath {
            path: joined.clone(),
            source,
        })?
        .into_owned();

    std::fs::create_dir_all(request.output_dir()).map_err(|source| {
        FilesystemError::CreateDir {
            path: request.output_dir().to_path_buf(),
            source,
        }
    })?;

    let content = request.content();
    let bytes = content.len();

    if request.overwrite() {
        write_file(&path, content)?;
        info!("Wrote review to {}", path.display());
        return Ok(WriteResult {
            path,
            bytes,
            overwritten: true,
        });
    }

    match create_exclusive(&path, content) {
        Ok(()) => {
            info!("Wrote review to {}", path.display());
            Ok(WriteResult {
                path,
                bytes,
                overwritten: false,
            })
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            let alternate = alternate_path(&path, &timestamp_suffix(now));
            debug!(
                "{} already exists, writing to {} instead",
                path.display(),
                alternate.display()
            );
            write_file(&alternate, content)?;
            info!("Wrote review to {}", alternate.display());
            Ok(WriteResult {
                path: alternate,
                bytes,
                overwritten: false,
            })
        }
        Err(source) => Err(FilesystemError::Write { path, source }),
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    std::fs::write(path, content).map_err(|source| FilesystemError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn create_exclusive(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(content.as_bytes())
}

/// `review.md` -> `review.<stamp>.md`
fn alternate_path(path: &Path, stamp: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = name.strip_suffix(MARKDOWN_SUFFIX).unwrap_or(&name);
    path.with_file_name(format!("{}.{}{}", stem, stamp, MARKDOWN_SUFFIX))
}
