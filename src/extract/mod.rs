pub mod ole2;
pub mod ooxml;

use crate::classify::SheetFormat;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid container: {0}")]
    Invalid(&'static str),

    #[error("unsupported compression method {0}")]
    Compression(u16),
}

/// Attempts to read the author property of a classified spreadsheet file.
///
/// `Ok(Some(author))` means the container parsed and carried the property.
/// `Ok(None)` means the container parsed but the metadata part, stream, or
/// property is absent. `Err` means the file could not be read or is not a
/// valid container of the expected kind. Callers assembling scan results
/// collapse all three into an optional author; the error carries the
/// diagnostic until then.
pub fn read_author(path: &Path, format: SheetFormat) -> Result<Option<String>, ExtractError> {
    match format {
        SheetFormat::Xlsx => ooxml::read_author(path),
        SheetFormat::Xls => ole2::read_author(path),
    }
}

// Length-checked little-endian accessors shared by both container parsers.
// Malformed offsets surface as errors, never as panics.

pub(crate) fn take(data: &[u8], offset: usize, len: usize) -> Result<&[u8], ExtractError> {
    let end = offset
        .checked_add(len)
        .ok_or(ExtractError::Invalid("offset overflow"))?;
    data.get(offset..end)
        .ok_or(ExtractError::Invalid("unexpected end of data"))
}

pub(crate) fn u16le(data: &[u8], offset: usize) -> Result<u16, ExtractError> {
    let bytes = take(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn u32le(data: &[u8], offset: usize) -> Result<u32, ExtractError> {
    let bytes = take(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
