//! Path resolution: turn a root path into the ordered list of files to load

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a root path resolved to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Source {
    /// A single regular file, whatever its extension
    File(PathBuf),
    /// A directory and its candidate files, sorted by full path
    Directory { root: PathBuf, files: Vec<PathBuf> },
}

impl Source {
    /// Candidate files in load order
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Source::File(path) => std::slice::from_ref(path),
            Source::Directory { files, .. } => files,
        }
    }
}

/// Resolve `root` into candidate files.
///
/// A directory is searched one level deep, or recursively when
/// `include_subfolders` is set. Only files accepted by `is_candidate` are
/// kept; everything else is dropped without being reported.
pub fn resolve<F>(root: &Path, include_subfolders: bool, is_candidate: F) -> Result<Source>
where
    F: Fn(&Path) -> bool,
{
    if root.is_file() {
        return Ok(Source::File(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::Path {
            path: root.to_path_buf(),
        });
    }

    let max_depth = if include_subfolders { usize::MAX } else { 1 };
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_file() && is_candidate(path) {
            files.push(path.to_path_buf());
        }
    }

    if files.is_empty() {
        return Err(Error::NoFilesFound {
            path: root.to_path_buf(),
        });
    }

    // Whole-path string order, so `data.csv` comes before `data/x.csv`
    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    tracing::debug!(root = %root.display(), count = files.len(), "resolved candidate files");

    Ok(Source::Directory {
        root: root.to_path_buf(),
        files,
    })
}
