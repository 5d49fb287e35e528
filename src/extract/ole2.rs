//! Author extraction from OLE2 compound file containers.
//!
//! A legacy `.xls` file is a Compound File Binary (structured storage). The
//! document metadata lives in the root storage as a stream named
//! `\x05SummaryInformation`, encoded as a property set whose property 4 is
//! the Author. Enough of the format is implemented to read one stream: the
//! header, the DIFAT/FAT, the directory, and the mini FAT with its backing
//! mini stream for streams below the standard-sector cutoff.

use super::{take, u16le, u32le, ExtractError};
use std::fs;
use std::path::Path;

const MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Largest sector id that names a regular sector; everything above is a
/// marker (DIFAT, FAT, end-of-chain, free).
const MAXREGSECT: u32 = 0xFFFF_FFFA;

const TYPE_STREAM: u8 = 2;
const TYPE_ROOT: u8 = 5;

const SUMMARY_INFORMATION_STREAM: &str = "\u{5}SummaryInformation";

/// FMTID {F29F85E0-4FF9-1068-AB91-08002B27B3D9} in its serialized layout.
const SUMMARY_INFORMATION_FMTID: [u8; 16] = [
    0xE0, 0x85, 0x9F, 0xF2, 0xF9, 0x4F, 0x68, 0x10, 0xAB, 0x91, 0x08, 0x00, 0x2B, 0x27, 0xB3,
    0xD9,
];

const PID_CODEPAGE: u32 = 1;
const PID_AUTHOR: u32 = 4;

const VT_I2: u32 = 2;
const VT_LPSTR: u32 = 30;
const VT_LPWSTR: u32 = 31;

pub fn read_author(path: &Path) -> Result<Option<String>, ExtractError> {
    let data = fs::read(path)?;
    let file = CompoundFile::parse(&data)?;
    match file.stream(SUMMARY_INFORMATION_STREAM)? {
        Some(stream) => summary_author(&stream),
        None => Ok(None),
    }
}

#[derive(Debug, Clone)]
struct DirEntry {
    name: String,
    entry_type: u8,
    start: u32,
    size: u64,
}

struct CompoundFile<'a> {
    data: &'a [u8],
    sector_size: usize,
    mini_sector_size: usize,
    mini_cutoff: u32,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    entries: Vec<DirEntry>,
    mini_stream: Vec<u8>,
}

impl<'a> CompoundFile<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, ExtractError> {
        if take(data, 0, 8)? != MAGIC {
            return Err(ExtractError::Invalid("not an OLE2 compound file"));
        }

        let sector_shift = u16le(data, 30)?;
        if sector_shift != 9 && sector_shift != 12 {
            return Err(ExtractError::Invalid("unsupported sector size"));
        }
        let sector_size = 1usize << sector_shift;

        let mini_shift = u16le(data, 32)?;
        if mini_shift != 6 {
            return Err(ExtractError::Invalid("unsupported mini sector size"));
        }
        let mini_sector_size = 1usize << mini_shift;

        let first_dir_sector = u32le(data, 48)?;
        let mini_cutoff = u32le(data, 56)?;
        let first_mini_fat = u32le(data, 60)?;
        let first_difat = u32le(data, 68)?;

        let fat = read_fat(data, sector_size, first_difat)?;

        let dir_bytes = read_chain(data, sector_size, &fat, first_dir_sector)?;
        let entries = parse_directory(&dir_bytes, sector_size)?;
        let root = entries
            .iter()
            .find(|e| e.entry_type == TYPE_ROOT)
            .cloned()
            .ok_or(ExtractError::Invalid("missing root storage entry"))?;

        // The mini FAT allocates 64-byte sectors out of a dedicated stream
        // whose chain hangs off the root entry.
        let (mini_fat, mini_stream) = if first_mini_fat <= MAXREGSECT {
            let mini_fat_bytes = read_chain(data, sector_size, &fat, first_mini_fat)?;
            let mini_fat = u32_entries(&mini_fat_bytes);
            let mut mini_stream = read_chain(data, sector_size, &fat, root.start)?;
            mini_stream.truncate(root.size.min(usize::MAX as u64) as usize);
            (mini_fat, mini_stream)
        } else {
            (Vec::new(), Vec::new())
        };

        Ok(Self {
            data,
            sector_size,
            mini_sector_size,
            mini_cutoff,
            fat,
            mini_fat,
            entries,
            mini_stream,
        })
    }

    /// Reads a named stream out of the root storage, or None when absent.
    fn stream(&self, name: &str) -> Result<Option<Vec<u8>>, ExtractError> {
        let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.entry_type == TYPE_STREAM && e.name == name)
        else {
            return Ok(None);
        };

        let mut bytes = if entry.size < self.mini_cutoff as u64 {
            self.read_mini_chain(entry.start)?
        } else {
            read_chain(self.data, self.sector_size, &self.fat, entry.start)?
        };

        let size = entry.size.min(usize::MAX as u64) as usize;
        if bytes.len() < size {
            return Err(ExtractError::Invalid("stream shorter than declared size"));
        }
        bytes.truncate(size);
        Ok(Some(bytes))
    }

    fn read_mini_chain(&self, start: u32) -> Result<Vec<u8>, ExtractError> {
        let mut out = Vec::new();
        let mut sid = start;
        let max_hops = self.mini_stream.len() / self.mini_sector_size + 1;
        let mut hops = 0;
        while sid <= MAXREGSECT {
            hops += 1;
            if hops > max_hops {
                return Err(ExtractError::Invalid("mini sector chain does not terminate"));
            }
            let offset = sid as usize * self.mini_sector_size;
            let chunk = self
                .mini_stream
                .get(offset..offset + self.mini_sector_size)
                .ok_or(ExtractError::Invalid("mini sector out of range"))?;
            out.extend_from_slice(chunk);
            sid = *self
                .mini_fat
                .get(sid as usize)
                .ok_or(ExtractError::Invalid("mini sector not covered by mini FAT"))?;
        }
        Ok(out)
    }
}

/// Sector `n` starts right after the 512-byte header region, at `(n+1)`
/// shifted by the sector size.
fn sector_bytes(data: &[u8], sector_size: usize, sid: u32) -> Result<&[u8], ExtractError> {
    take(data, (sid as usize + 1) * sector_size, sector_size)
}

fn u32_entries(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Assembles the FAT from the 109 DIFAT slots in the header plus any chained
/// DIFAT sectors.
fn read_fat(data: &[u8], sector_size: usize, first_difat: u32) -> Result<Vec<u32>, ExtractError> {
    let mut fat_sectors: Vec<u32> = Vec::new();
    for i in 0..109 {
        let sid = u32le(data, 76 + i * 4)?;
        if sid <= MAXREGSECT {
            fat_sectors.push(sid);
        }
    }

    let max_hops = data.len() / sector_size + 1;
    let mut hops = 0;
    let mut sid = first_difat;
    while sid <= MAXREGSECT {
        hops += 1;
        if hops > max_hops {
            return Err(ExtractError::Invalid("DIFAT chain does not terminate"));
        }
        let sector = sector_bytes(data, sector_size, sid)?;
        let entries = u32_entries(sector);
        for &entry in &entries[..entries.len() - 1] {
            if entry <= MAXREGSECT {
                fat_sectors.push(entry);
            }
        }
        // the final slot chains to the next DIFAT sector
        sid = entries[entries.len() - 1];
    }

    let mut fat = Vec::with_capacity(fat_sectors.len() * (sector_size / 4));
    for fat_sid in fat_sectors {
        fat.extend(u32_entries(sector_bytes(data, sector_size, fat_sid)?));
    }
    Ok(fat)
}

fn read_chain(
    data: &[u8],
    sector_size: usize,
    fat: &[u32],
    start: u32,
) -> Result<Vec<u8>, ExtractError> {
    let mut out = Vec::new();
    let mut sid = start;
    let max_hops = data.len() / sector_size + 1;
    let mut hops = 0;
    while sid <= MAXREGSECT {
        hops += 1;
        if hops > max_hops {
            return Err(ExtractError::Invalid("sector chain does not terminate"));
        }
        out.extend_from_slice(sector_bytes(data, sector_size, sid)?);
        sid = *fat
            .get(sid as usize)
            .ok_or(ExtractError::Invalid("sector not covered by FAT"))?;
    }
    Ok(out)
}

fn parse_directory(dir: &[u8], sector_size: usize) -> Result<Vec<DirEntry>, ExtractError> {
    let mut entries = Vec::new();
    for raw in dir.chunks_exact(128) {
        let name_len = u16le(raw, 64)? as usize;
        let entry_type = raw[66];
        if entry_type == 0 || name_len < 2 || name_len > 64 {
            continue;
        }
        let units: Vec<u16> = raw[..name_len - 2]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        let name = String::from_utf16_lossy(&units);
        let start = u32le(raw, 116)?;
        // the high half of the size field is only meaningful for 4096-byte
        // sector files
        let size = if sector_size == 512 {
            u32le(raw, 120)? as u64
        } else {
            u32le(raw, 120)? as u64 | (u32le(raw, 124)? as u64) << 32
        };
        entries.push(DirEntry {
            name,
            entry_type,
            start,
            size,
        });
    }
    Ok(entries)
}

/// Parses a SummaryInformation property set and returns its Author property,
/// decoded per the set's CodePage property.
fn summary_author(stream: &[u8]) -> Result<Option<String>, ExtractError> {
    if u16le(stream, 0)? != 0xFFFE {
        return Err(ExtractError::Invalid("bad property set byte order mark"));
    }
    let set_count = u32le(stream, 24)? as usize;

    let mut section_offset = None;
    for i in 0..set_count.min(4) {
        if take(stream, 28 + i * 20, 16)? == SUMMARY_INFORMATION_FMTID {
            section_offset = Some(u32le(stream, 44 + i * 20)? as usize);
            break;
        }
    }
    let Some(section) = section_offset else {
        return Ok(None);
    };

    let prop_count = u32le(stream, section + 4)? as usize;
    let mut codepage: u16 = 1252;
    let mut author_offset = None;
    for i in 0..prop_count {
        let pid = u32le(stream, section + 8 + i * 8)?;
        let offset = u32le(stream, section + 12 + i * 8)? as usize;
        match pid {
            PID_CODEPAGE => {
                if u32le(stream, section + offset)? == VT_I2 {
                    codepage = u16le(stream, section + offset + 4)?;
                }
            }
            PID_AUTHOR => author_offset = Some(offset),
            _ => {}
        }
    }
    let Some(offset) = author_offset else {
        return Ok(None);
    };

    match u32le(stream, section + offset)? {
        VT_LPSTR => {
            let len = u32le(stream, section + offset + 4)? as usize;
            let bytes = take(stream, section + offset + 8, len)?;
            let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            Ok(Some(decode_codepage(&bytes[..end], codepage)))
        }
        VT_LPWSTR => {
            let chars = u32le(stream, section + offset + 4)? as usize;
            let raw = take(stream, section + offset + 8, chars * 2)?;
            let mut units = Vec::with_capacity(chars);
            for pair in raw.chunks_exact(2) {
                units.push(u16::from_le_bytes([pair[0], pair[1]]));
            }
            while units.last() == Some(&0) {
                units.pop();
            }
            Ok(Some(String::from_utf16_lossy(&units)))
        }
        _ => Ok(None),
    }
}

/// Windows-1252 code points for the 0x80..0xA0 range; the rest of the code
/// page coincides with Latin-1.
const CP1252_C1: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

fn decode_codepage(bytes: &[u8], codepage: u16) -> String {
    match codepage {
        1200 => {
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        65001 => String::from_utf8_lossy(bytes).into_owned(),
        _ => bytes
            .iter()
            .map(|&b| match b {
                0x80..=0x9F => CP1252_C1[(b - 0x80) as usize],
                _ => b as char,
            })
            .collect(),
    }
}
