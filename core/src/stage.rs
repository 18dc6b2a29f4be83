//! Temporary-directory staging.
//!
//! Copies the build's base directory into a fresh temporary directory and
//! hands that back as the build root, so pre-build hook side effects (and
//! the archive's file reads) are isolated from the caller's source tree.
//! Staging is expressed as "build from this explicit root"; nothing ever
//! changes the process working directory.

use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use tempfile::TempDir;

/// A staged copy of the base directory.
///
/// The staging directory is deleted when this value is dropped, which
/// must outlive the build that reads from it.
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
    root: Utf8PathBuf,
}

impl Staging {
    /// Copy `base_dir` into a fresh temporary directory.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Staging`] when the temporary directory
    /// cannot be created or the copy fails.
    pub fn materialize(base_dir: &Utf8Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("detzip")
            .tempdir()
            .map_err(|e| BuildError::Staging {
                reason: format!("failed to create temporary directory: {e}"),
            })?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).map_err(|p| {
            BuildError::NonUtf8Path { path: p }
        })?;

        copy_tree(base_dir, &root)?;
        debug!("staged {base_dir} into {root}");

        Ok(Self { dir, root })
    }

    /// The staged build root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Consume the staging and delete its directory now.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Staging`] when removal fails.
    pub fn close(self) -> Result<()> {
        self.dir.close().map_err(|e| BuildError::Staging {
            reason: format!("failed to remove staging directory: {e}"),
        })
    }
}

/// Recursively copy a directory tree.
///
/// Regular files are copied byte-for-byte; symlinks to files are followed
/// and copied as regular files; other entry kinds are skipped.
///
/// # Errors
///
/// Returns [`BuildError::Staging`] naming the entry that failed.
pub fn copy_tree(src: &Utf8Path, dst: &Utf8Path) -> Result<()> {
    // Open the source first so an unreadable source fails before any
    // destination directory exists.
    let entries = fs::read_dir(src).map_err(|e| BuildError::Staging {
        reason: format!("failed to read {src}: {e}"),
    })?;

    fs::create_dir_all(dst).map_err(|e| BuildError::Staging {
        reason: format!("failed to create {dst}: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| BuildError::Staging {
            reason: format!("failed to read an entry of {src}: {e}"),
        })?;
        let name = entry.file_name();
        let name = name.to_str().ok_or_else(|| BuildError::NonUtf8Path {
            path: entry.path(),
        })?;
        let from = src.join(name);
        let to = dst.join(name);

        // Metadata follows symlinks, so a link to a directory recurses
        // into its target and a link to a file is copied as a file.
        let metadata = fs::metadata(&from).map_err(|e| BuildError::Staging {
            reason: format!("failed to stat {from}: {e}"),
        })?;

        if metadata.is_dir() {
            copy_tree(&from, &to)?;
        } else if metadata.is_file() {
            fs::copy(&from, &to).map_err(|e| BuildError::Staging {
                reason: format!("failed to copy {from} to {to}: {e}"),
            })?;
        }
    }

    Ok(())
}
