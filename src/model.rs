use std::path::PathBuf;

/// A spreadsheet file discovered during a scan, together with whatever author
/// metadata could be extracted from it. Immutable once created; a fresh set is
/// built on every scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetFile {
    pub full_path: PathBuf,
    pub author: Option<String>,
}

impl SheetFile {
    pub fn new(full_path: PathBuf, author: Option<String>) -> Self {
        Self { full_path, author }
    }

    /// Final path component.
    pub fn name(&self) -> String {
        self.full_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Stable per-file identifier: the full path with every path separator
    /// replaced by an underscore. Not guaranteed collision-free for paths that
    /// already contain underscores.
    pub fn id(&self) -> String {
        self.full_path
            .to_string_lossy()
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect()
    }

    /// Author for display. Storage keeps the raw extraction result; the
    /// placeholder is applied here only.
    pub fn display_author(&self) -> &str {
        match &self.author {
            Some(author) if !author.trim().is_empty() => author,
            _ => "No author found",
        }
    }
}
