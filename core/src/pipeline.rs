//! Build pipeline orchestration.
//!
//! Sequences resolution, assembly, and digesting for one build request,
//! plus the standalone fingerprinting operation used as a cheap
//! change-detection trigger. The pipeline is synchronous and
//! single-threaded per invocation; every stage reads files one at a time
//! in the defined order.

use crate::archive;
use crate::digest;
use crate::error::{BuildError, Result};
use crate::hook::{self, CommandExecutor, ShellExecutor};
use crate::pattern::{self, PatternSet};
use crate::stage::Staging;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::collections::BTreeMap;
use std::fs;

/// A validated, typed build request.
///
/// This is a plain configuration struct checked by explicit precondition
/// tests before the pipeline runs; there is no schema framework behind
/// it.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory patterns and relative paths are resolved against.
    pub base_dir: Utf8PathBuf,
    /// Include glob patterns for filesystem-backed entries.
    pub sources: Vec<String>,
    /// Exclude glob patterns, applied after the includes.
    pub excludes: Vec<String>,
    /// Inline contents keyed by logical archive path.
    pub contents: BTreeMap<String, String>,
    /// Where the assembled archive is written.
    pub output: Utf8PathBuf,
    /// Optional command line run before resolution.
    pub before_build: Option<String>,
    /// Copy the base directory into a temporary staging root first.
    pub use_temp_dir: bool,
    /// Compression level: -1 default, 0 store, 1-9 deflate effort.
    pub compression_level: i32,
    /// Leading path components stripped from every entry name.
    pub strip_components: usize,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            base_dir: Utf8PathBuf::from("."),
            sources: Vec::new(),
            excludes: Vec::new(),
            contents: BTreeMap::new(),
            output: Utf8PathBuf::new(),
            before_build: None,
            use_temp_dir: false,
            compression_level: archive::DEFAULT_LEVEL,
            strip_components: 0,
        }
    }
}

/// Result of a completed build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Path of the written archive.
    pub archive_path: Utf8PathBuf,
    /// Standard-base64 SHA-256 fingerprint of the archive bytes.
    pub base64_sha256: String,
    /// The resolved file paths that went into the archive, in order.
    pub files: Vec<String>,
}

/// Inputs for the standalone fingerprinting operation.
#[derive(Debug, Clone)]
pub struct FingerprintRequest {
    /// Directory patterns are resolved against.
    pub base_dir: Utf8PathBuf,
    /// Include glob patterns for files to hash.
    pub files: Vec<String>,
    /// Exclude glob patterns, applied after the includes.
    pub excludes: Vec<String>,
    /// Inline contents keyed by logical name.
    pub contents: BTreeMap<String, String>,
    /// Accept include patterns that match nothing.
    pub allow_missing: bool,
}

impl Default for FingerprintRequest {
    fn default() -> Self {
        Self {
            base_dir: Utf8PathBuf::from("."),
            files: Vec::new(),
            excludes: Vec::new(),
            contents: BTreeMap::new(),
            allow_missing: false,
        }
    }
}

/// Run a build with the system shell executor for the pre-build hook.
///
/// # Errors
///
/// See [`build_with`].
pub fn build(request: &BuildRequest) -> Result<BuildOutput> {
    build_with(request, &ShellExecutor)
}

/// Run a build: validate, stage, hook, resolve, assemble, fingerprint.
///
/// The pre-build hook runs only when source patterns are present, after
/// staging and before resolution, so its side effects land in the tree
/// the globs will see. All stages operate on an explicit base directory;
/// the process working directory is never changed.
///
/// # Errors
///
/// Any stage error aborts the build and is returned verbatim; no partial
/// archive or digest is produced on failure.
pub fn build_with(request: &BuildRequest, executor: &dyn CommandExecutor) -> Result<BuildOutput> {
    validate(request)?;

    let staging = if request.use_temp_dir {
        Some(Staging::materialize(&request.base_dir)?)
    } else {
        None
    };
    let base_dir = staging
        .as_ref()
        .map_or(request.base_dir.as_path(), Staging::root);

    let files = if request.sources.is_empty() {
        Vec::new()
    } else {
        if let Some(command_line) = request.before_build.as_deref() {
            hook::run_hook(executor, command_line, base_dir)?;
        }

        let patterns = PatternSet::new(request.sources.clone(), request.excludes.clone());
        pattern::resolve(base_dir, &patterns, false)?
    };

    archive::assemble_to_file(
        base_dir,
        &files,
        &request.contents,
        request.compression_level,
        request.strip_components,
        &request.output,
    )?;

    let base64_sha256 = digest::base64_sha256(&request.output)?;
    info!(
        "built {} ({} file entries, {} inline entries)",
        request.output,
        files.len(),
        request.contents.len()
    );

    Ok(BuildOutput {
        archive_path: request.output.clone(),
        base64_sha256,
        files,
    })
}

/// Fingerprint a file set and inline contents without building.
///
/// Resolves the include and exclude patterns, hashes each file, and
/// merges the inline-content digests over the file digests; an inline
/// name that collides with a file path wins.
///
/// # Errors
///
/// Returns [`BuildError::InvalidRequest`] when both inputs are empty,
/// [`BuildError::PatternNotFound`] in strict mode, and
/// [`BuildError::Hash`] when a resolved file cannot be read.
pub fn fingerprint(request: &FingerprintRequest) -> Result<BTreeMap<String, String>> {
    if request.files.is_empty() && request.contents.is_empty() {
        return Err(BuildError::InvalidRequest {
            reason: "at least one of files or contents must be non-empty".to_owned(),
        });
    }

    let mut map = if request.files.is_empty() {
        BTreeMap::new()
    } else {
        let patterns = PatternSet::new(request.files.clone(), request.excludes.clone());
        let files = pattern::resolve(&request.base_dir, &patterns, !request.allow_missing)?;
        digest::sha256_map(&request.base_dir, &files)?
    };

    map.extend(digest::contents_sha256_map(&request.contents));
    Ok(map)
}

/// Delete a previously produced artifact.
///
/// A file that is already absent counts as success.
///
/// # Errors
///
/// Returns [`BuildError::Io`] for any failure other than the file not
/// existing.
pub fn remove_artifact(path: &Utf8Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BuildError::Io(e)),
    }
}

/// Check the request preconditions before any stage runs.
fn validate(request: &BuildRequest) -> Result<()> {
    if request.sources.is_empty() && request.contents.is_empty() {
        return Err(BuildError::InvalidRequest {
            reason: "at least one of sources or contents must be non-empty".to_owned(),
        });
    }

    if !(-1..=9).contains(&request.compression_level) {
        return Err(BuildError::InvalidRequest {
            reason: format!(
                "compression level {} is outside -1..=9",
                request.compression_level
            ),
        });
    }

    if request.output.as_str().is_empty() {
        return Err(BuildError::InvalidRequest {
            reason: "output path must not be empty".to_owned(),
        });
    }

    Ok(())
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
