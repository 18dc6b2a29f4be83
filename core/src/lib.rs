//! Deterministic deployment-archive engine.
//!
//! Packages a selected, deduplicated set of filesystem entries and inline
//! text snippets into a deterministic ZIP archive, then fingerprints the
//! result: byte-identical output for the same logical inputs, regardless
//! of directory iteration order or OS. This crate powers the `detzip` CLI
//! and can be consumed programmatically.
//!
//! # Modules
//!
//! - [`archive`] - Deterministic Zip32 assembly with entry-name stripping
//! - [`digest`] - SHA-256 fingerprints, hex per entry and base64 per artifact
//! - [`error`] - Semantic error types, terminal for the current build
//! - [`hook`] - Pre-build command hook behind a stubbable executor
//! - [`pattern`] - Glob include/exclude resolution into sorted path sets
//! - [`pipeline`] - Build and fingerprint orchestration
//! - [`stage`] - Temporary-directory staging of the source tree

pub mod archive;
pub mod digest;
pub mod error;
pub mod hook;
pub mod pattern;
pub mod pipeline;
pub mod stage;

pub use error::{BuildError, Result};
pub use pipeline::{BuildOutput, BuildRequest, FingerprintRequest};
