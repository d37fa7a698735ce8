//! Walks a source tree and collects the text files worth documenting.

use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;

/// A single scanned file. Paths are relative to the scan root and use `/` as separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub content: String,
    /// Extension without the leading dot; empty when the file has none.
    pub extension: String,
    pub size: usize,
    pub lines: usize,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let content = content.into();
        let extension = Path::new(&path)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            size: content.len(),
            lines: content.lines().count(),
            extension,
            path,
            content,
        }
    }
}

/// Scanned files keyed by relative path. Iteration order carries no meaning.
pub type FileCollection = HashMap<String, FileRecord>;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("scan root {0} does not exist or is not a directory")]
    RootNotFound(PathBuf),
}

/// Collect every readable UTF-8 file under `config.root` whose extension is recognised
/// and whose path crosses no excluded directory.
///
/// Unreadable entries are logged and skipped; only a missing root is an error.
pub fn scan(config: &ScanConfig) -> Result<FileCollection, ScanError> {
    let root = config.root.as_path();
    info!(root = %root.display(), "Scanning codebase");
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }

    let mut files = FileCollection::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_excluded_dir(entry, root, &config.excluded_dirs));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        if has_excluded_component(relative, &config.excluded_dirs) {
            continue;
        }
        let extension = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if config.extensions.contains(ext) => ext,
            _ => continue,
        };

        match std::fs::read_to_string(path) {
            Ok(content) => {
                let key = relative_key(relative);
                debug!(path = %key, extension, size = content.len(), "Scanned file");
                files.insert(key.clone(), FileRecord::new(key, content));
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Error reading file, skipping");
            }
        }
    }

    info!(count = files.len(), "Found files to analyze");
    Ok(files)
}

fn is_excluded_dir(entry: &DirEntry, root: &Path, excluded: &BTreeSet<String>) -> bool {
    // The root itself is always walked, even if its own name is on the list.
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .path()
        .strip_prefix(root)
        .map(|rel| has_excluded_component(rel, excluded))
        .unwrap_or(false)
}

fn has_excluded_component(relative: &Path, excluded: &BTreeSet<String>) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(name) => name.to_str().is_some_and(|n| excluded.contains(n)),
        _ => false,
    })
}

fn relative_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
