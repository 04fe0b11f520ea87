//! Workspace scanning.
//!
//! A "workspace" is a directory tree whose display name keys the remote
//! project record and whose file set is what gets mirrored. Enumeration
//! walks the tree, skips hidden entries, and returns absolute paths in a
//! stable (sorted) order.

use std::path::Path;

use thiserror::Error;
use walkdir::WalkDir;

/// Errors from workspace scanning.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The workspace root does not exist or is not a directory.
    #[error("workspace root is not a directory: {0}")]
    NotADirectory(String),

    /// The root has no usable display name (e.g. a bare `/`).
    #[error("workspace root has no name: {0}")]
    Unnamed(String),

    /// Filesystem error while walking the tree.
    #[error("failed to scan workspace: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Returns the workspace display name: the root directory's file name.
pub fn workspace_name(root: &Path) -> Result<String, WorkspaceError> {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| WorkspaceError::Unnamed(root.display().to_string()))
}

/// Enumerates all files under the workspace root.
///
/// Hidden entries (any path component starting with `.`) are skipped,
/// directories are not listed, and the result is sorted so that repeated
/// enumerations of an unchanged tree compare equal.
pub fn enumerate_files(root: &Path) -> Result<Vec<String>, WorkspaceError> {
    if !root.is_dir() {
        return Err(WorkspaceError::NotADirectory(root.display().to_string()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.path() == root || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_string_lossy().into_owned());
        }
    }

    files.sort();
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn name_is_root_directory_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("Alpha");
        fs::create_dir(&root).unwrap();
        assert_eq!(workspace_name(&root).unwrap(), "Alpha");
    }

    #[test]
    fn enumeration_lists_files_sorted_and_skips_hidden() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        fs::write(root.join("b.ts"), "").unwrap();
        fs::write(root.join("a.ts"), "").unwrap();
        fs::create_dir(root.join("src")).unwrap();
        fs::write(root.join("src").join("c.ts"), "").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git").join("HEAD"), "").unwrap();
        fs::write(root.join(".hidden"), "").unwrap();

        let files = enumerate_files(root).unwrap();
        let expected = vec![
            root.join("a.ts").to_string_lossy().into_owned(),
            root.join("b.ts").to_string_lossy().into_owned(),
            root.join("src").join("c.ts").to_string_lossy().into_owned(),
        ];
        assert_eq!(files, expected);
    }

    #[test]
    fn enumeration_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            enumerate_files(&missing),
            Err(WorkspaceError::NotADirectory(_))
        ));
    }
}
