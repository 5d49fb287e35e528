use std::path::Path;

/// The two supported spreadsheet container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// Open Packaging Conventions zip container (modern format).
    Xlsx,
    /// OLE2 compound file container (legacy format).
    Xls,
}

/// Classifies a path by its extension, or rejects it.
///
/// Matching is case-insensitive and suffix-based: any extension ending in
/// `xlsx` counts as Xlsx, and any other extension ending in `xls` counts as
/// Xls. The `xlsx` check runs first since `xlsx` itself ends in `xls`.
pub fn classify(path: &Path) -> Option<SheetFormat> {
    let name = path.file_name()?.to_str()?;
    let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
    if ext.ends_with("xlsx") {
        Some(SheetFormat::Xlsx)
    } else if ext.ends_with("xls") {
        Some(SheetFormat::Xls)
    } else {
        None
    }
}
