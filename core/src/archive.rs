//! Deterministic ZIP assembly.
//!
//! Merges filesystem-backed entries and in-memory named entries into one
//! Zip32 container with fully controlled entry ordering and metadata, so
//! the output bytes are a pure function of the logical inputs. Entries
//! carry a fixed timestamp (the ZIP epoch, 1980-01-01) and no extra
//! fields; compression is raw deflate via `flate2`, or store at level 0.
//!
//! Entries are written in two phases: all file-path entries in resolver
//! order first, then all inline entries in sorted-key order. Duplicate
//! names across the two phases are written twice, never deduplicated;
//! how a reader treats them is a reader concern.

use crate::error::{BuildError, Result};
use camino::Utf8Path;
use flate2::write::DeflateEncoder;
use flate2::{Compression, Crc};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;

/// Compression level meaning "store, no compression".
pub const STORE: i32 = 0;

/// Compression level meaning "library default deflate effort".
pub const DEFAULT_LEVEL: i32 = -1;

/// Local file header signature.
const LOCAL_HEADER_SIG: u32 = 0x0403_4b50;
/// Central directory file header signature.
const CENTRAL_HEADER_SIG: u32 = 0x0201_4b50;
/// End of central directory signature.
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;

/// Version needed to extract: 2.0, deflate support.
const VERSION_NEEDED: u16 = 20;
/// General purpose flag bit 11: entry name is UTF-8.
const UTF8_NAME_FLAG: u16 = 0x0800;
/// MS-DOS date for 1980-01-01, the ZIP epoch.
const DOS_EPOCH_DATE: u16 = 0x0021;

/// Drop `n` leading path components from a `/`-separated entry name.
///
/// With `n == 0` the path is returned unchanged, including any leading
/// separator. Otherwise a single leading separator is removed first; when
/// `n` is at least the number of remaining segments the result is empty,
/// which callers treat as "drop this entry".
///
/// # Examples
///
/// ```
/// use detzip_core::archive::strip;
///
/// assert_eq!(strip("foo/bar/zoo", 0), "foo/bar/zoo");
/// assert_eq!(strip("foo/bar/zoo", 1), "bar/zoo");
/// assert_eq!(strip("foo/bar/zoo", 3), "");
/// assert_eq!(strip("/foo/bar/zoo", 1), "bar/zoo");
/// ```
#[must_use]
pub fn strip(path: &str, n: usize) -> String {
    if n == 0 {
        return path.to_owned();
    }

    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let segments: Vec<&str> = trimmed.split('/').collect();

    match segments.get(n..) {
        None | Some([]) => String::new(),
        Some(rest) => rest.join("/"),
    }
}

/// Assemble an archive in memory and return its bytes.
///
/// `files` are read beneath `base_dir` in the order given (the resolver's
/// sort order); `contents` are written afterwards in sorted-key order.
/// Each name passes through [`strip`] with `strip_components`; entries
/// whose stripped name is empty are skipped entirely.
///
/// # Errors
///
/// Returns [`BuildError::InvalidRequest`] for a compression level outside
/// `-1..=9`, [`BuildError::Read`] when a source file cannot be read, and
/// [`BuildError::ArchiveWrite`] / [`BuildError::ArchiveLimit`] on
/// container failures. No partial archive is returned.
pub fn assemble(
    base_dir: &Utf8Path,
    files: &[String],
    contents: &BTreeMap<String, String>,
    compression_level: i32,
    strip_components: usize,
) -> Result<Vec<u8>> {
    let mut writer = ZipStreamWriter::new(Vec::new(), method_for_level(compression_level)?);
    append_entries(&mut writer, base_dir, files, contents, strip_components)?;
    writer.finish()
}

/// Assemble an archive directly to `output` on the filesystem.
///
/// # Errors
///
/// As [`assemble`], plus [`BuildError::Io`] when the output file cannot
/// be created. A failed build may leave a truncated file at `output`;
/// callers treat any error as "no artifact produced".
pub fn assemble_to_file(
    base_dir: &Utf8Path,
    files: &[String],
    contents: &BTreeMap<String, String>,
    compression_level: i32,
    strip_components: usize,
    output: &Utf8Path,
) -> Result<()> {
    let file = fs::File::create(output)?;
    let mut writer = ZipStreamWriter::new(
        std::io::BufWriter::new(file),
        method_for_level(compression_level)?,
    );
    append_entries(&mut writer, base_dir, files, contents, strip_components)?;
    let mut out = writer.finish()?;
    out.flush()
        .map_err(|source| BuildError::ArchiveWrite { source })?;

    debug!("wrote archive {output}");
    Ok(())
}

/// Write both entry phases into `writer`.
fn append_entries<W: Write>(
    writer: &mut ZipStreamWriter<W>,
    base_dir: &Utf8Path,
    files: &[String],
    contents: &BTreeMap<String, String>,
    strip_components: usize,
) -> Result<()> {
    for path in files {
        let name = strip(path, strip_components);

        if name.is_empty() {
            continue;
        }

        let full = base_dir.join(path);
        let bytes = fs::read(&full).map_err(|source| BuildError::Read { path: full, source })?;
        writer.add_entry(&name, &bytes)?;
    }

    // BTreeMap iteration gives the same byte-wise key ordering the
    // resolver uses for paths.
    for (name, data) in contents {
        let stripped = strip(name, strip_components);

        if stripped.is_empty() {
            continue;
        }

        writer.add_entry(&stripped, data.as_bytes())?;
    }

    Ok(())
}

/// The single compression method registered for a whole archive.
#[derive(Debug, Clone, Copy)]
enum Method {
    /// Entries are stored verbatim.
    Store,
    /// Entries are deflated at the given effort.
    Deflate(Compression),
}

impl Method {
    /// ZIP method id: 0 for store, 8 for deflate.
    fn id(self) -> u16 {
        match self {
            Self::Store => 0,
            Self::Deflate(_) => 8,
        }
    }
}

/// Map a caller-facing compression level to a [`Method`].
fn method_for_level(level: i32) -> Result<Method> {
    match level {
        STORE => Ok(Method::Store),
        DEFAULT_LEVEL => Ok(Method::Deflate(Compression::default())),
        1..=9 => Ok(Method::Deflate(Compression::new(
            u32::try_from(level).unwrap_or_default(),
        ))),
        _ => Err(BuildError::InvalidRequest {
            reason: format!("compression level {level} is outside -1..=9"),
        }),
    }
}

/// Metadata recorded per entry for the central directory.
struct EntryRecord {
    name: String,
    flags: u16,
    method: u16,
    crc: u32,
    compressed_size: u32,
    size: u32,
    offset: u32,
}

/// Streaming Zip32 writer with fixed, deterministic metadata.
///
/// Entry payloads are compressed in memory before the local header is
/// written, so sizes and CRCs go into the header directly and no data
/// descriptors are emitted.
struct ZipStreamWriter<W: Write> {
    out: W,
    offset: u64,
    method: Method,
    entries: Vec<EntryRecord>,
}

impl<W: Write> ZipStreamWriter<W> {
    fn new(out: W, method: Method) -> Self {
        Self {
            out,
            offset: 0,
            method,
            entries: Vec::new(),
        }
    }

    /// Append one named entry with the given raw bytes.
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let data = match self.method {
            Method::Store => bytes.to_vec(),
            Method::Deflate(level) => deflate(bytes, level)?,
        };

        let mut crc = Crc::new();
        crc.update(bytes);

        let name_len = u16::try_from(name.len()).map_err(|_| BuildError::ArchiveLimit {
            reason: format!("entry name exceeds 65535 bytes: `{name}`"),
        })?;
        let size = zip32_size(name, bytes.len())?;
        let compressed_size = zip32_size(name, data.len())?;
        let offset = u32::try_from(self.offset).map_err(|_| BuildError::ArchiveLimit {
            reason: format!("archive exceeds 4 GiB before entry `{name}`"),
        })?;
        let flags = if name.is_ascii() { 0 } else { UTF8_NAME_FLAG };
        let record = EntryRecord {
            name: name.to_owned(),
            flags,
            method: self.method.id(),
            crc: crc.sum(),
            compressed_size,
            size,
            offset,
        };

        self.write_u32(LOCAL_HEADER_SIG)?;
        self.write_u16(VERSION_NEEDED)?;
        self.write_u16(record.flags)?;
        self.write_u16(record.method)?;
        self.write_u16(0)?; // mod time: midnight
        self.write_u16(DOS_EPOCH_DATE)?;
        self.write_u32(record.crc)?;
        self.write_u32(record.compressed_size)?;
        self.write_u32(record.size)?;
        self.write_u16(name_len)?;
        self.write_u16(0)?; // extra field length
        self.write_bytes(name.as_bytes())?;
        self.write_bytes(&data)?;

        self.entries.push(record);
        Ok(())
    }

    /// Write the central directory and end record, returning the sink.
    fn finish(mut self) -> Result<W> {
        let central_start = u32::try_from(self.offset).map_err(|_| BuildError::ArchiveLimit {
            reason: "central directory starts beyond 4 GiB".to_owned(),
        })?;
        let count = u16::try_from(self.entries.len()).map_err(|_| BuildError::ArchiveLimit {
            reason: format!("{} entries exceed the Zip32 limit", self.entries.len()),
        })?;

        let records = std::mem::take(&mut self.entries);

        for record in &records {
            let name_len = u16::try_from(record.name.len()).unwrap_or_default();

            self.write_u32(CENTRAL_HEADER_SIG)?;
            self.write_u16(VERSION_NEEDED)?; // version made by
            self.write_u16(VERSION_NEEDED)?;
            self.write_u16(record.flags)?;
            self.write_u16(record.method)?;
            self.write_u16(0)?; // mod time
            self.write_u16(DOS_EPOCH_DATE)?;
            self.write_u32(record.crc)?;
            self.write_u32(record.compressed_size)?;
            self.write_u32(record.size)?;
            self.write_u16(name_len)?;
            self.write_u16(0)?; // extra field length
            self.write_u16(0)?; // comment length
            self.write_u16(0)?; // disk number
            self.write_u16(0)?; // internal attributes
            self.write_u32(0)?; // external attributes
            self.write_u32(record.offset)?;
            self.write_bytes(record.name.as_bytes())?;
        }

        let central_end = u32::try_from(self.offset).map_err(|_| BuildError::ArchiveLimit {
            reason: "central directory ends beyond 4 GiB".to_owned(),
        })?;
        let central_size = central_end - central_start;

        self.write_u32(END_OF_CENTRAL_DIR_SIG)?;
        self.write_u16(0)?; // disk number
        self.write_u16(0)?; // disk with central directory
        self.write_u16(count)?;
        self.write_u16(count)?;
        self.write_u32(central_size)?;
        self.write_u32(central_start)?;
        self.write_u16(0)?; // comment length

        Ok(self.out)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.out
            .write_all(bytes)
            .map_err(|source| BuildError::ArchiveWrite { source })?;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }
}

/// Raw-deflate `bytes` at the given effort.
fn deflate(bytes: &[u8], level: Compression) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), level);
    encoder
        .write_all(bytes)
        .map_err(|source| BuildError::ArchiveWrite { source })?;
    encoder
        .finish()
        .map_err(|source| BuildError::ArchiveWrite { source })
}

/// Bounds-check one size field against the Zip32 limit.
fn zip32_size(name: &str, len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| BuildError::ArchiveLimit {
        reason: format!("entry `{name}` exceeds 4 GiB"),
    })
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
