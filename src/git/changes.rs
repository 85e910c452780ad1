//! Changed-file discovery and per-file unified diffs.

use std::collections::HashSet;
use std::path::Path;

use git2::{Diff, ErrorCode, Patch, Repository, Status, StatusOptions, Tree};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VcsError;

/// Paths that are never reported as changes. Compared against the whole relative path.
pub const EXCLUDED_FILES: &[&str] = &["dist", "bun.lock"];

/// Which side of the index to diff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// HEAD against the index (`git diff --cached`).
    Staged,
    /// Index against the working tree (`git diff`).
    #[default]
    Unstaged,
}

/// A changed file and its unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    pub file: String,
    pub diff: String,
}

pub fn is_excluded(path: &str) -> bool {
    EXCLUDED_FILES.contains(&path)
}

/// Open the repository containing `root`, searching parent directories.
pub fn open_repository(root: &Path) -> Result<Repository, VcsError> {
    Repository::discover(root).map_err(|source| VcsError::OpenRepository {
        path: root.to_path_buf(),
        source,
    })
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, VcsError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(VcsError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(VcsError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect every file that differs between the last commit and the working
/// tree, together with its unified diff text.
///
/// Untracked files are not part of the diff. Denylisted paths are skipped.
pub fn get_changes(root: &Path) -> Result<Vec<ChangedFile>, VcsError> {
    let repo = open_repository(root)?;
    let head_tree = resolve_head_tree(&repo)?;

    let diff = repo
        .diff_tree_to_workdir_with_index(head_tree.as_ref(), None)
        .map_err(VcsError::DiffFailed)?;

    let mut changes = Vec::new();
    for idx in 0..diff.deltas().len() {
        let Some(path) = delta_path(&diff, idx) else {
            continue;
        };
        if is_excluded(&path) {
            debug!("Skipping excluded path {}", path);
            continue;
        }
        let text = render_patch(&diff, idx, &path)?;
        changes.push(ChangedFile { file: path, diff: text });
    }

    debug!("Collected {} changed files under {}", changes.len(), root.display());
    Ok(changes)
}

/// List changed paths for the given mode, excluding denylisted entries.
pub fn changed_paths(repo: &Repository, mode: DiffMode) -> Result<Vec<String>, VcsError> {
    let diff = match mode {
        DiffMode::Staged => {
            let head_tree = resolve_head_tree(repo)?;
            repo.diff_tree_to_index(head_tree.as_ref(), None, None)
        }
        DiffMode::Unstaged => repo.diff_index_to_workdir(None, None),
    }
    .map_err(VcsError::DiffFailed)?;

    Ok((0..diff.deltas().len())
        .filter_map(|idx| delta_path(&diff, idx))
        .filter(|path| !is_excluded(path))
        .collect())
}

/// Union of the paths reported by `git status`.
///
/// Order: created, modified, renamed (destination), untracked, deleted.
/// The first occurrence of a path wins; denylisted entries are skipped.
pub fn status_paths(repo: &Repository) -> Result<Vec<String>, VcsError> {
    let mut opts = StatusOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .renames_head_to_index(true);

    let statuses = repo
        .statuses(Some(&mut opts))
        .map_err(VcsError::StatusFailed)?;

    let mut created = Vec::new();
    let mut modified = Vec::new();
    let mut renamed = Vec::new();
    let mut not_added = Vec::new();
    let mut deleted = Vec::new();

    for entry in statuses.iter() {
        let status = entry.status();
        let Some(path) = entry.path().map(str::to_string) else {
            continue;
        };

        if status.contains(Status::INDEX_NEW) {
            created.push(path.clone());
        }
        if status.intersects(Status::INDEX_MODIFIED | Status::WT_MODIFIED) {
            modified.push(path.clone());
        }
        if status.intersects(Status::INDEX_RENAMED | Status::WT_RENAMED) {
            let destination = entry
                .head_to_index()
                .or_else(|| entry.index_to_workdir())
                .and_then(|d| d.new_file().path())
                .map(|p| p.to_string_lossy().to_string());
            if let Some(destination) = destination {
                renamed.push(destination);
            }
        }
        if status.contains(Status::WT_NEW) {
            not_added.push(path.clone());
        }
        if status.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
            deleted.push(path);
        }
    }

    let mut seen = HashSet::new();
    Ok(created
        .into_iter()
        .chain(modified)
        .chain(renamed)
        .chain(not_added)
        .chain(deleted)
        .filter(|path| !path.is_empty() && !is_excluded(path))
        .filter(|path| seen.insert(path.clone()))
        .collect())
}

fn delta_path(diff: &Diff<'_>, idx: usize) -> Option<String> {
    let delta = diff.get_delta(idx)?;
    delta
        .new_file()
        .path()
        .or_else(|| delta.old_file().path())
        .map(|p| p.to_string_lossy().to_string())
        .filter(|p| !p.is_empty())
}

fn render_patch(diff: &Diff<'_>, idx: usize, path: &str) -> Result<String, VcsError> {
    let patch = Patch::from_diff(diff, idx).map_err(|source| VcsError::PatchFailed {
        path: path.to_string(),
        source,
    })?;

    let Some(mut patch) = patch else {
        return Ok(format!("Binary files a/{path} and b/{path} differ\n"));
    };

    let buf = patch.to_buf().map_err(|source| VcsError::PatchFailed {
        path: path.to_string(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&buf).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;

    fn init_repo_with_commit(files: &[(&str, &str)]) -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        {
            let mut index = repo.index().unwrap();
            for (name, content) in files {
                let full = dir.path().join(name);
                if let Some(parent) = full.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(&full, content).unwrap();
                index.add_path(Path::new(name)).unwrap();
            }
            index.write().unwrap();
            let tree_id = index.write_tree().unwrap();
            let tree = repo.find_tree(tree_id).unwrap();
            let sig = Signature::now("Test", "test@test.com").unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        (dir, repo)
    }

    fn stage(repo: &Repository, path: &str) {
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
    }

    #[test]
    fn test_is_excluded_matches_whole_path_only() {
        assert!(is_excluded("dist"));
        assert!(is_excluded("bun.lock"));
        assert!(!is_excluded("dist/index.js"));
        assert!(!is_excluded("web/bun.lock"));
    }

    #[test]
    fn test_diff_mode_default_is_unstaged() {
        assert_eq!(DiffMode::default(), DiffMode::Unstaged);
    }

    #[test]
    fn test_get_changes_returns_diff_per_file() {
        let (dir, _repo) = init_repo_with_commit(&[("a.txt", "one\n"), ("b.txt", "two\n")]);
        std::fs::write(dir.path().join("a.txt"), "one\nmore\n").unwrap();

        let changes = get_changes(dir.path()).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].file, "a.txt");
        assert!(changes[0].diff.contains("+more"));
        assert!(changes[0].diff.contains("a/a.txt"));
    }

    #[test]
    fn test_get_changes_skips_excluded_paths() {
        let (dir, _repo) =
            init_repo_with_commit(&[("bun.lock", "v1\n"), ("main.ts", "let a = 1;\n")]);
        std::fs::write(dir.path().join("bun.lock"), "v2\n").unwrap();
        std::fs::write(dir.path().join("main.ts"), "let a = 2;\n").unwrap();

        let changes = get_changes(dir.path()).unwrap();
        let files: Vec<&str> = changes.iter().map(|c| c.file.as_str()).collect();
        assert_eq!(files, vec!["main.ts"]);
    }

    #[test]
    fn test_get_changes_includes_staged_and_unstaged() {
        let (dir, repo) = init_repo_with_commit(&[("a.txt", "a\n"), ("b.txt", "b\n")]);
        std::fs::write(dir.path().join("a.txt"), "a staged\n").unwrap();
        stage(&repo, "a.txt");
        std::fs::write(dir.path().join("b.txt"), "b unstaged\n").unwrap();

        let changes = get_changes(dir.path()).unwrap();
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn test_get_changes_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = get_changes(dir.path());
        assert!(matches!(result, Err(VcsError::OpenRepository { .. })));
    }

    #[test]
    fn test_changed_paths_respects_mode() {
        let (dir, repo) = init_repo_with_commit(&[("a.txt", "a\n"), ("b.txt", "b\n")]);
        std::fs::write(dir.path().join("a.txt"), "a staged\n").unwrap();
        stage(&repo, "a.txt");
        std::fs::write(dir.path().join("b.txt"), "b unstaged\n").unwrap();

        assert_eq!(changed_paths(&repo, DiffMode::Staged).unwrap(), vec!["a.txt"]);
        assert_eq!(changed_paths(&repo, DiffMode::Unstaged).unwrap(), vec!["b.txt"]);
    }

    #[test]
    fn test_changed_paths_ignores_untracked_files() {
        let (dir, repo) = init_repo_with_commit(&[("a.txt", "a\n")]);
        std::fs::write(dir.path().join("new.txt"), "new\n").unwrap();

        assert!(changed_paths(&repo, DiffMode::Unstaged).unwrap().is_empty());
    }

    #[test]
    fn test_status_paths_orders_created_before_untracked() {
        let (dir, repo) = init_repo_with_commit(&[("a.txt", "a\n")]);
        std::fs::write(dir.path().join("untracked.txt"), "u\n").unwrap();
        std::fs::write(dir.path().join("added.txt"), "n\n").unwrap();
        stage(&repo, "added.txt");

        let paths = status_paths(&repo).unwrap();
        assert_eq!(paths, vec!["added.txt", "untracked.txt"]);
    }

    #[test]
    fn test_status_paths_skips_excluded_and_reports_deleted() {
        let (dir, repo) = init_repo_with_commit(&[("gone.txt", "x\n")]);
        std::fs::remove_file(dir.path().join("gone.txt")).unwrap();
        std::fs::write(dir.path().join("bun.lock"), "lock\n").unwrap();

        let paths = status_paths(&repo).unwrap();
        assert_eq!(paths, vec!["gone.txt"]);
    }
}
