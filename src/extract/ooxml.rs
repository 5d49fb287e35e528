//! Author extraction from Open Packaging Conventions containers.
//!
//! An `.xlsx` file is a ZIP archive. The package-level core-properties part
//! (normally `docProps/core.xml`, resolved through the package relationships
//! part when present) carries the `creator` element. Only the pieces of ZIP
//! needed to read one part are implemented: end-of-central-directory lookup,
//! the central directory index, and stored/DEFLATE entry data.

use super::{take, u16le, u32le, ExtractError};
use flate2::read::DeflateDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;

const EOCD_SIG: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
const CENTRAL_SIG: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];
const LOCAL_SIG: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

const PACKAGE_RELS_PART: &str = "_rels/.rels";
const DEFAULT_CORE_PART: &str = "docProps/core.xml";
const CORE_PROPERTIES_REL: &str = "core-properties";

struct Entry {
    name: String,
    method: u16,
    compressed_size: u32,
    local_offset: u32,
}

pub fn read_author(path: &Path) -> Result<Option<String>, ExtractError> {
    let data = fs::read(path)?;
    let entries = read_central_directory(&data)?;

    let core_part = core_properties_part(&data, &entries);
    let Some(entry) = entries.iter().find(|e| e.name == core_part) else {
        return Ok(None);
    };

    let xml_bytes = read_entry(&data, entry)?;
    let xml = String::from_utf8_lossy(&xml_bytes);
    Ok(element_text(&xml, "creator"))
}

/// Scans backwards for the end-of-central-directory record. The record is at
/// most 22 bytes plus a 64KiB comment from the end of the archive.
fn find_eocd(data: &[u8]) -> Option<usize> {
    if data.len() < 22 {
        return None;
    }
    let lower = data.len().saturating_sub(22 + u16::MAX as usize);
    (lower..=data.len() - 22).rev().find(|&i| data[i..i + 4] == EOCD_SIG)
}

fn read_central_directory(data: &[u8]) -> Result<Vec<Entry>, ExtractError> {
    let eocd = find_eocd(data).ok_or(ExtractError::Invalid("not a ZIP archive"))?;
    let total_entries = u16le(data, eocd + 10)? as usize;
    let cd_offset = u32le(data, eocd + 16)? as usize;

    let mut entries = Vec::with_capacity(total_entries);
    let mut pos = cd_offset;
    for _ in 0..total_entries {
        if take(data, pos, 4)? != CENTRAL_SIG {
            return Err(ExtractError::Invalid("bad central directory signature"));
        }
        let method = u16le(data, pos + 10)?;
        let compressed_size = u32le(data, pos + 20)?;
        let name_len = u16le(data, pos + 28)? as usize;
        let extra_len = u16le(data, pos + 30)? as usize;
        let comment_len = u16le(data, pos + 32)? as usize;
        let local_offset = u32le(data, pos + 42)?;
        let name = String::from_utf8_lossy(take(data, pos + 46, name_len)?).into_owned();

        entries.push(Entry {
            name,
            method,
            compressed_size,
            local_offset,
        });
        pos += 46 + name_len + extra_len + comment_len;
    }
    Ok(entries)
}

fn read_entry(data: &[u8], entry: &Entry) -> Result<Vec<u8>, ExtractError> {
    let offset = entry.local_offset as usize;
    if take(data, offset, 4)? != LOCAL_SIG {
        return Err(ExtractError::Invalid("bad local header signature"));
    }
    let name_len = u16le(data, offset + 26)? as usize;
    let extra_len = u16le(data, offset + 28)? as usize;
    let start = offset + 30 + name_len + extra_len;
    let compressed = take(data, start, entry.compressed_size as usize)?;

    match entry.method {
        METHOD_STORED => Ok(compressed.to_vec()),
        METHOD_DEFLATE => {
            let mut out = Vec::new();
            DeflateDecoder::new(compressed)
                .read_to_end(&mut out)
                .map_err(|_| ExtractError::Invalid("corrupt DEFLATE stream"))?;
            Ok(out)
        }
        method => Err(ExtractError::Compression(method)),
    }
}

/// Resolves the core-properties part name through the package relationships
/// part, falling back to the conventional location when the relationships are
/// absent or unreadable.
fn core_properties_part(data: &[u8], entries: &[Entry]) -> String {
    let Some(rels) = entries.iter().find(|e| e.name == PACKAGE_RELS_PART) else {
        return DEFAULT_CORE_PART.to_string();
    };
    let Ok(xml_bytes) = read_entry(data, rels) else {
        return DEFAULT_CORE_PART.to_string();
    };
    let xml = String::from_utf8_lossy(&xml_bytes);
    match relationship_target(&xml, CORE_PROPERTIES_REL) {
        Some(target) => target.trim_start_matches('/').to_string(),
        None => DEFAULT_CORE_PART.to_string(),
    }
}

/// Finds the Target of the first Relationship whose Type ends with the given
/// fragment.
fn relationship_target(xml: &str, type_suffix: &str) -> Option<String> {
    let mut pos = 0;
    while let Some(found) = xml[pos..].find("<Relationship ") {
        let tag_start = pos + found;
        let tag_end = xml[tag_start..].find('>')? + tag_start;
        let tag = &xml[tag_start..tag_end];
        if attr_value(tag, "Type").is_some_and(|t| t.ends_with(type_suffix)) {
            if let Some(target) = attr_value(tag, "Target") {
                return Some(target.to_string());
            }
        }
        pos = tag_end + 1;
    }
    None
}

fn attr_value<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{}=", name);
    let start = tag.find(&needle)? + needle.len();
    let rest = tag.get(start..)?;
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value = &rest[1..];
    let end = value.find(quote)?;
    Some(&value[..end])
}

/// Returns the text content of the first element with the given local name,
/// whatever its namespace prefix. Entities are unescaped; a self-closing
/// element yields an empty string.
fn element_text(xml: &str, local_name: &str) -> Option<String> {
    let mut pos = 0;
    while let Some(found) = xml[pos..].find('<') {
        let tag_start = pos + found + 1;
        let rest = &xml[tag_start..];
        if rest.starts_with('/') || rest.starts_with('!') || rest.starts_with('?') {
            pos = tag_start;
            continue;
        }
        let tag_end = xml[tag_start..].find('>')? + tag_start;
        let tag_body = &xml[tag_start..tag_end];
        let self_closing = tag_body.ends_with('/');
        let name = tag_body
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();

        let local = name.rsplit(':').next().unwrap_or(name);
        if local == local_name && (name == local_name || name.contains(':')) {
            if self_closing {
                return Some(String::new());
            }
            let close = format!("</{}>", name);
            let content_start = tag_end + 1;
            let content_end = xml[content_start..].find(&close)? + content_start;
            return Some(unescape_xml(&xml[content_start..content_end]));
        }
        pos = tag_end + 1;
    }
    None
}

fn unescape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let consumed = if tail.starts_with("&lt;") {
            out.push('<');
            4
        } else if tail.starts_with("&gt;") {
            out.push('>');
            4
        } else if tail.starts_with("&amp;") {
            out.push('&');
            5
        } else if tail.starts_with("&quot;") {
            out.push('"');
            6
        } else if tail.starts_with("&apos;") {
            out.push('\'');
            6
        } else if let Some(len) = push_numeric_entity(tail, &mut out) {
            len
        } else {
            out.push('&');
            1
        };
        rest = &tail[consumed..];
    }
    out.push_str(rest);
    out
}

fn push_numeric_entity(tail: &str, out: &mut String) -> Option<usize> {
    let body = tail.strip_prefix("&#")?;
    let end = body.find(';')?;
    let digits = &body[..end];
    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    out.push(char::from_u32(code)?);
    Some(2 + end + 1)
}
