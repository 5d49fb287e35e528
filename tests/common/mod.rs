//! Fixture builders: just enough ZIP and compound-file writing to produce
//! real spreadsheet containers for the pipeline tests.

#![allow(dead_code)]

use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use std::io::Write;

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend(value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend(value.to_le_bytes());
}

/// Builds a ZIP archive from (name, content, deflate?) parts.
pub fn build_zip(parts: &[(&str, &[u8], bool)]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut central = Vec::new();

    for (name, content, deflate) in parts {
        let (method, stored): (u16, Vec<u8>) = if *deflate {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(content).unwrap();
            (8, encoder.finish().unwrap())
        } else {
            (0, content.to_vec())
        };
        let mut crc = Crc::new();
        crc.update(content);
        let crc = crc.sum();
        let offset = out.len() as u32;

        out.extend([0x50, 0x4B, 0x03, 0x04]);
        put_u16(&mut out, 20);
        put_u16(&mut out, 0);
        put_u16(&mut out, method);
        put_u16(&mut out, 0);
        put_u16(&mut out, 0);
        put_u32(&mut out, crc);
        put_u32(&mut out, stored.len() as u32);
        put_u32(&mut out, content.len() as u32);
        put_u16(&mut out, name.len() as u16);
        put_u16(&mut out, 0);
        out.extend(name.as_bytes());
        out.extend(&stored);

        central.extend([0x50, 0x4B, 0x01, 0x02]);
        put_u16(&mut central, 20);
        put_u16(&mut central, 20);
        put_u16(&mut central, 0);
        put_u16(&mut central, method);
        put_u16(&mut central, 0);
        put_u16(&mut central, 0);
        put_u32(&mut central, crc);
        put_u32(&mut central, stored.len() as u32);
        put_u32(&mut central, content.len() as u32);
        put_u16(&mut central, name.len() as u16);
        put_u16(&mut central, 0);
        put_u16(&mut central, 0);
        put_u16(&mut central, 0);
        put_u16(&mut central, 0);
        put_u32(&mut central, 0);
        put_u32(&mut central, offset);
        central.extend(name.as_bytes());
    }

    let cd_offset = out.len() as u32;
    out.extend(&central);
    out.extend([0x50, 0x4B, 0x05, 0x06]);
    put_u16(&mut out, 0);
    put_u16(&mut out, 0);
    put_u16(&mut out, parts.len() as u16);
    put_u16(&mut out, parts.len() as u16);
    put_u32(&mut out, central.len() as u32);
    put_u32(&mut out, cd_offset);
    put_u16(&mut out, 0);
    out
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

pub fn core_properties_xml(creator: Option<&str>) -> String {
    let creator_element = match creator {
        Some(name) => format!("<dc:creator>{}</dc:creator>", name),
        None => String::new(),
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">{}<cp:lastModifiedBy>someone else</cp:lastModifiedBy></cp:coreProperties>"#,
        creator_element
    )
}

/// A minimal but well-formed xlsx package with the given creator.
pub fn xlsx_bytes(creator: Option<&str>) -> Vec<u8> {
    let core = core_properties_xml(creator);
    build_zip(&[
        ("[Content_Types].xml", CONTENT_TYPES_XML.as_bytes(), false),
        ("_rels/.rels", PACKAGE_RELS_XML.as_bytes(), false),
        ("docProps/core.xml", core.as_bytes(), false),
    ])
}

// Compound file constants for the builder below.
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ENDOFCHAIN: u32 = 0xFFFF_FFFE;
const FREESECT: u32 = 0xFFFF_FFFF;
const FATSECT: u32 = 0xFFFF_FFFD;
const NOSTREAM: u32 = 0xFFFF_FFFF;

fn cfb_dir_entry(name: &str, entry_type: u8, child: u32, start: u32, size: u32) -> Vec<u8> {
    let mut entry = vec![0u8; 128];
    let units: Vec<u16> = name.encode_utf16().collect();
    assert!(units.len() <= 31, "directory entry name too long");
    for (i, unit) in units.iter().enumerate() {
        entry[i * 2..i * 2 + 2].copy_from_slice(&unit.to_le_bytes());
    }
    entry[64..66].copy_from_slice(&(((units.len() + 1) * 2) as u16).to_le_bytes());
    entry[66] = entry_type;
    entry[67] = 1;
    entry[68..72].copy_from_slice(&NOSTREAM.to_le_bytes());
    entry[72..76].copy_from_slice(&NOSTREAM.to_le_bytes());
    entry[76..80].copy_from_slice(&child.to_le_bytes());
    entry[116..120].copy_from_slice(&start.to_le_bytes());
    entry[120..124].copy_from_slice(&size.to_le_bytes());
    entry
}

fn cfb_header(first_mini_fat: u32, mini_fat_count: u32) -> Vec<u8> {
    let mut header = vec![0u8; 512];
    header[0..8].copy_from_slice(&CFB_MAGIC);
    header[24..26].copy_from_slice(&0x3Eu16.to_le_bytes());
    header[26..28].copy_from_slice(&3u16.to_le_bytes());
    header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());
    header[30..32].copy_from_slice(&9u16.to_le_bytes());
    header[32..34].copy_from_slice(&6u16.to_le_bytes());
    header[44..48].copy_from_slice(&1u32.to_le_bytes()); // one FAT sector
    header[48..52].copy_from_slice(&1u32.to_le_bytes()); // directory at sector 1
    header[56..60].copy_from_slice(&4096u32.to_le_bytes());
    header[60..64].copy_from_slice(&first_mini_fat.to_le_bytes());
    header[64..68].copy_from_slice(&mini_fat_count.to_le_bytes());
    header[68..72].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
    // no chained DIFAT; slot 0 points at the FAT sector
    header[76..80].copy_from_slice(&0u32.to_le_bytes());
    for slot in 1..109 {
        header[76 + slot * 4..80 + slot * 4].copy_from_slice(&FREESECT.to_le_bytes());
    }
    header
}

fn fat_sector(entries: &[u32]) -> Vec<u8> {
    let mut sector = Vec::with_capacity(512);
    for i in 0..128 {
        sector.extend(entries.get(i).copied().unwrap_or(FREESECT).to_le_bytes());
    }
    sector
}

/// Builds a version-3 compound file holding a single stream in its root
/// storage. Streams under the 4096-byte cutoff go through the mini FAT and
/// the root's mini stream, as real writers do; larger streams sit directly in
/// FAT sectors.
pub fn cfb_bytes(stream_name: &str, stream: &[u8]) -> Vec<u8> {
    if stream.len() < 4096 {
        let mini_count = stream.len().div_ceil(64).max(1);
        let mini_stream_len = mini_count * 64;
        let container_count = mini_stream_len.div_ceil(512);

        // sector 0: FAT, 1: directory, 2: mini FAT, 3..: mini stream
        let mut fat = vec![FATSECT, ENDOFCHAIN, ENDOFCHAIN];
        for i in 0..container_count {
            fat.push(if i + 1 < container_count {
                4 + i as u32
            } else {
                ENDOFCHAIN
            });
        }

        let mut directory = Vec::new();
        directory.extend(cfb_dir_entry(
            "Root Entry",
            5,
            1,
            3,
            mini_stream_len as u32,
        ));
        directory.extend(cfb_dir_entry(stream_name, 2, NOSTREAM, 0, stream.len() as u32));
        directory.resize(512, 0);

        let mut mini_fat = Vec::new();
        for i in 0..mini_count {
            mini_fat.push(if i + 1 < mini_count {
                i as u32 + 1
            } else {
                ENDOFCHAIN
            });
        }

        let mut out = cfb_header(2, 1);
        out.extend(fat_sector(&fat));
        out.extend(directory);
        out.extend(fat_sector(&mini_fat));
        let mut padded = stream.to_vec();
        padded.resize(container_count * 512, 0);
        out.extend(padded);
        out
    } else {
        let data_count = stream.len().div_ceil(512);

        // sector 0: FAT, 1: directory, 2..: stream data
        let mut fat = vec![FATSECT, ENDOFCHAIN];
        for i in 0..data_count {
            fat.push(if i + 1 < data_count {
                3 + i as u32
            } else {
                ENDOFCHAIN
            });
        }

        let mut directory = Vec::new();
        directory.extend(cfb_dir_entry("Root Entry", 5, 1, ENDOFCHAIN, 0));
        directory.extend(cfb_dir_entry(stream_name, 2, NOSTREAM, 2, stream.len() as u32));
        directory.resize(512, 0);

        let mut out = cfb_header(ENDOFCHAIN, 0);
        out.extend(fat_sector(&fat));
        out.extend(directory);
        let mut padded = stream.to_vec();
        padded.resize(data_count * 512, 0);
        out.extend(padded);
        out
    }
}

const VT_I2: u32 = 2;
const VT_LPSTR: u32 = 30;

const SUMMARY_INFORMATION_FMTID: [u8; 16] = [
    0xE0, 0x85, 0x9F, 0xF2, 0xF9, 0x4F, 0x68, 0x10, 0xAB, 0x91, 0x08, 0x00, 0x2B, 0x27, 0xB3,
    0xD9,
];

/// A SummaryInformation property set with a CodePage property and an Author
/// stored as a codepage string.
pub fn summary_info_bytes(author_bytes: &[u8], codepage: u16) -> Vec<u8> {
    let mut codepage_value = VT_I2.to_le_bytes().to_vec();
    codepage_value.extend(codepage.to_le_bytes());
    codepage_value.extend([0, 0]);

    let mut author_value = VT_LPSTR.to_le_bytes().to_vec();
    author_value.extend(((author_bytes.len() + 1) as u32).to_le_bytes());
    author_value.extend(author_bytes);
    author_value.push(0);

    let props: [(u32, &[u8]); 2] = [(1, &codepage_value), (4, &author_value)];

    let mut stream = Vec::new();
    stream.extend(0xFFFEu16.to_le_bytes());
    stream.extend(0u16.to_le_bytes());
    stream.extend(2u32.to_le_bytes());
    stream.extend([0u8; 16]);
    stream.extend(1u32.to_le_bytes());
    stream.extend(SUMMARY_INFORMATION_FMTID);
    stream.extend(48u32.to_le_bytes());

    let header_len = 8 + props.len() * 8;
    let mut offsets = Vec::new();
    let mut values = Vec::new();
    for (_, value) in &props {
        offsets.push(header_len + values.len());
        values.extend_from_slice(value);
    }

    stream.extend(((header_len + values.len()) as u32).to_le_bytes());
    stream.extend((props.len() as u32).to_le_bytes());
    for ((pid, _), offset) in props.iter().zip(&offsets) {
        stream.extend(pid.to_le_bytes());
        stream.extend((*offset as u32).to_le_bytes());
    }
    stream.extend(values);
    stream
}

/// A minimal but well-formed legacy xls container with the given author.
pub fn xls_bytes(author: &str) -> Vec<u8> {
    cfb_bytes(
        "\u{5}SummaryInformation",
        &summary_info_bytes(author.as_bytes(), 1252),
    )
}
