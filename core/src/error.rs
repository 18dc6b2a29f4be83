//! Error types for deterministic archive builds.
//!
//! This module defines semantic error variants covering the whole build
//! pipeline: glob resolution, archive assembly, and fingerprinting. Every
//! error is terminal for the current build; no partial archive or partial
//! digest map is ever returned. The offending pattern or path is named in
//! the message so callers can surface it verbatim.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, assembling, or fingerprinting.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A glob pattern could not be parsed.
    #[error("invalid glob pattern `{pattern}`: {reason}")]
    PatternSyntax {
        /// The malformed pattern as supplied by the caller.
        pattern: String,
        /// Description of the syntax error.
        reason: String,
    },

    /// An include pattern matched no files while strict mode was requested.
    #[error("pattern `{pattern}` matched no files")]
    PatternNotFound {
        /// The pattern that produced no matches.
        pattern: String,
    },

    /// A file could not be read during traversal or archiving.
    #[error("failed to read {path}")]
    Read {
        /// Path that could not be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while writing the output container.
    #[error("failed to write archive")]
    ArchiveWrite {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The archive exceeded a Zip32 limit (entry count or size).
    #[error("archive too large: {reason}")]
    ArchiveLimit {
        /// Which limit was exceeded.
        reason: String,
    },

    /// A file could not be read while computing its digest.
    #[error("failed to hash {path}")]
    Hash {
        /// Path that could not be hashed.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The build request failed precondition validation.
    #[error("invalid build request: {reason}")]
    InvalidRequest {
        /// Description of the failed precondition.
        reason: String,
    },

    /// The pre-build hook exited with a failure status.
    #[error("pre-build hook `{command}` failed\noutput: {output}")]
    Hook {
        /// The command line that was run.
        command: String,
        /// Combined stdout and stderr from the command, or `(empty)`.
        output: String,
    },

    /// Copying the source tree into the staging directory failed.
    #[error("staging failed: {reason}")]
    Staging {
        /// Description of the staging failure.
        reason: String,
    },

    /// A filesystem path was not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: std::path::PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`BuildError`].
pub type Result<T> = std::result::Result<T, BuildError>;
