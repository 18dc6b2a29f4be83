//! Content fingerprinting with SHA-256.
//!
//! Pure, stateless digest helpers: a lowercase hex digest per named input
//! (file path or inline snippet) and a standard padded base64 digest over
//! a whole file, used to fingerprint the assembled artifact. Callers may
//! fingerprint a file set without building an archive, as a cheap
//! change-detection trigger.

use crate::error::{BuildError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use camino::Utf8Path;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;

/// Compute the standard-base64 SHA-256 digest of the file at `path`.
///
/// Used for the whole-artifact fingerprint after assembly.
///
/// # Errors
///
/// Returns [`BuildError::Hash`] when the file cannot be read.
pub fn base64_sha256(path: &Utf8Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| BuildError::Hash {
        path: path.to_owned(),
        source,
    })?;
    Ok(BASE64.encode(Sha256::digest(&bytes)))
}

/// Compute lowercase hex SHA-256 digests for each path beneath `base_dir`.
///
/// Keys in the returned map are the relative path strings as given. Any
/// read failure aborts the whole call; no partial map is returned.
///
/// # Errors
///
/// Returns [`BuildError::Hash`] naming the first unreadable path.
pub fn sha256_map(base_dir: &Utf8Path, paths: &[String]) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();

    for path in paths {
        let full = base_dir.join(path);
        let bytes = fs::read(&full).map_err(|source| BuildError::Hash { path: full, source })?;
        map.insert(path.clone(), hex_sha256(&bytes));
    }

    Ok(map)
}

/// Compute lowercase hex SHA-256 digests for in-memory named contents.
///
/// The inputs are already in memory, so this cannot fail.
#[must_use]
pub fn contents_sha256_map(contents: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    contents
        .iter()
        .map(|(name, data)| (name.clone(), hex_sha256(data.as_bytes())))
        .collect()
}

/// Lowercase hex SHA-256 of a byte buffer.
fn hex_sha256(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
