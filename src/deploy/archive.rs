//! Deterministic ZIP encoder.
//!
//! Writes the three record types by hand (local file header, central
//! directory header, end-of-central-directory) so the output is byte-stable:
//! modification time and date are zeroed and entries appear exactly in input
//! order. Content is raw-deflated; entries are compressed in parallel and
//! stitched together sequentially so offsets stay exact.
//!
//! Classic 32-bit ZIP only. Anything past the u32 size or u16 entry-count
//! limits is an encoding error rather than a silent ZIP64 upgrade.

use std::io::Write;
use std::path::Path;

use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use rayon::prelude::*;

use crate::error::{Result, ShipError};

const LOCAL_HEADER_SIG: u32 = 0x0403_4B50;
const CENTRAL_HEADER_SIG: u32 = 0x0201_4B50;
const EOCD_SIG: u32 = 0x0605_4B50;

/// Fixed portion of the local file header, before name and data.
const LOCAL_HEADER_LEN: usize = 30;
/// Fixed portion of a central directory header, before the name.
const CENTRAL_HEADER_LEN: usize = 46;
const EOCD_LEN: usize = 22;

const ZIP_VERSION: u16 = 20;
const METHOD_DEFLATE: u16 = 8;

/// One file headed for the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// '/'-separated path as it will appear inside the archive.
    pub relative_path: String,
    pub content: Vec<u8>,
}

/// Read filtered paths from disk into archive entries, preserving order.
pub fn read_file_entries(root: &Path, files: &[String]) -> Result<Vec<FileEntry>> {
    files
        .iter()
        .map(|relative| {
            let content = std::fs::read(root.join(relative))
                .map_err(|err| ShipError::Encode(format!("read {relative}: {err}")))?;
            Ok(FileEntry {
                relative_path: relative.clone(),
                content,
            })
        })
        .collect()
}

struct CompressedEntry {
    crc: u32,
    data: Vec<u8>,
}

fn compress(content: &[u8]) -> Result<CompressedEntry> {
    let mut crc = Crc::new();
    crc.update(content);

    // Empty files never touch the compressor: zero-length data, CRC 0.
    if content.is_empty() {
        return Ok(CompressedEntry {
            crc: crc.sum(),
            data: Vec::new(),
        });
    }

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(content)
        .map_err(|err| ShipError::Encode(format!("deflate: {err}")))?;
    let data = encoder
        .finish()
        .map_err(|err| ShipError::Encode(format!("deflate: {err}")))?;

    Ok(CompressedEntry {
        crc: crc.sum(),
        data,
    })
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn bounded_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| ShipError::Encode(format!("{what} exceeds the 32-bit zip limit")))
}

/// Encode `entries` into a complete ZIP archive.
///
/// Input order is preserved verbatim, so callers that sort their file list
/// get a reproducible archive for the same tree.
pub fn encode_archive(entries: &[FileEntry]) -> Result<Vec<u8>> {
    let entry_count = u16::try_from(entries.len())
        .map_err(|_| ShipError::Encode(format!("{} entries exceed the zip limit", entries.len())))?;

    let compressed: Vec<CompressedEntry> = entries
        .par_iter()
        .map(|entry| compress(&entry.content))
        .collect::<Result<Vec<_>>>()?;

    let mut out = Vec::new();
    let mut local_offsets = Vec::with_capacity(entries.len());

    for (entry, packed) in entries.iter().zip(&compressed) {
        let name = entry.relative_path.as_bytes();
        let name_len = u16::try_from(name.len()).map_err(|_| {
            ShipError::Encode(format!("path too long for zip: {}", entry.relative_path))
        })?;
        let compressed_size = bounded_u32(packed.data.len(), "compressed size")?;
        let uncompressed_size = bounded_u32(entry.content.len(), "file size")?;
        local_offsets.push(bounded_u32(out.len(), "archive size")?);

        put_u32(&mut out, LOCAL_HEADER_SIG);
        put_u16(&mut out, ZIP_VERSION); // version needed to extract
        put_u16(&mut out, 0); // general purpose flags
        put_u16(&mut out, METHOD_DEFLATE);
        put_u16(&mut out, 0); // mod time, zeroed
        put_u16(&mut out, 0); // mod date, zeroed
        put_u32(&mut out, packed.crc);
        put_u32(&mut out, compressed_size);
        put_u32(&mut out, uncompressed_size);
        put_u16(&mut out, name_len);
        put_u16(&mut out, 0); // extra field length
        out.extend_from_slice(name);
        out.extend_from_slice(&packed.data);
    }

    let central_offset = bounded_u32(out.len(), "central directory offset")?;

    for ((entry, packed), local_offset) in entries.iter().zip(&compressed).zip(&local_offsets) {
        let name = entry.relative_path.as_bytes();
        let name_len = u16::try_from(name.len()).map_err(|_| {
            ShipError::Encode(format!("path too long for zip: {}", entry.relative_path))
        })?;

        put_u32(&mut out, CENTRAL_HEADER_SIG);
        put_u16(&mut out, ZIP_VERSION); // version made by
        put_u16(&mut out, ZIP_VERSION); // version needed to extract
        put_u16(&mut out, 0); // general purpose flags
        put_u16(&mut out, METHOD_DEFLATE);
        put_u16(&mut out, 0); // mod time
        put_u16(&mut out, 0); // mod date
        put_u32(&mut out, packed.crc);
        put_u32(&mut out, bounded_u32(packed.data.len(), "compressed size")?);
        put_u32(&mut out, bounded_u32(entry.content.len(), "file size")?);
        put_u16(&mut out, name_len);
        put_u16(&mut out, 0); // extra field length
        put_u16(&mut out, 0); // comment length
        put_u16(&mut out, 0); // disk number start
        put_u16(&mut out, 0); // internal attributes
        put_u32(&mut out, 0); // external attributes
        put_u32(&mut out, *local_offset);
        out.extend_from_slice(name);
    }

    let central_size = bounded_u32(
        out.len() - central_offset as usize,
        "central directory size",
    )?;

    put_u32(&mut out, EOCD_SIG);
    put_u16(&mut out, 0); // disk number
    put_u16(&mut out, 0); // disk holding the central directory
    put_u16(&mut out, entry_count); // entries on this disk
    put_u16(&mut out, entry_count); // entries total
    put_u32(&mut out, central_size);
    put_u32(&mut out, central_offset);
    put_u16(&mut out, 0); // comment length

    Ok(out)
}
