use glob::Pattern;
use std::path::{Path, PathBuf};
use tracing::{error, warn};
use walkdir::WalkDir;

pub fn compile_ignore_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect()
}

fn is_ignored(path: &Path, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|pattern| pattern.matches_path(path))
}

/// Recursively enumerates the regular files under one root.
///
/// Entries within each directory are visited in file-name order, so discovery
/// order is deterministic for a given tree. Symbolic links are neither
/// followed nor reported, which also rules out traversal cycles. Ignored
/// directories are pruned without descending.
///
/// A subtree that cannot be read (permission denied, vanished mount) is
/// logged and skipped; siblings and the rest of the walk continue. A single
/// inaccessible directory never aborts the scan.
pub fn walk_root(root: &Path, ignore_patterns: &[Pattern]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        .into_iter()
        .filter_entry(|entry| !is_ignored(entry.path(), ignore_patterns));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(err) => {
                warn!("Skipping inaccessible path under {}: {}", root.display(), err);
            }
        }
    }

    files
}
