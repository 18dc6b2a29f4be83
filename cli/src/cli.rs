//! CLI argument definitions for detzip.
//!
//! Separated from the main entrypoint to keep the binary focused on
//! orchestration. Argument structs convert into the core crate's typed
//! requests; no validation beyond parsing happens here.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use detzip_core::{BuildRequest, FingerprintRequest};

/// Build deterministic deployment archives and fingerprint file sets.
#[derive(Parser, Debug)]
#[command(name = "detzip")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build deterministic deployment archives.\n\n",
    "Given include and exclude glob patterns and named inline contents, detzip ",
    "always produces byte-identical output for the same logical inputs, ",
    "regardless of directory iteration order or OS. The archive is a plain ",
    "deflate/store ZIP readable by any standard ZIP reader.\n\n",
    "EXAMPLES:\n",
    "  Package an application tree:\n",
    "    $ detzip build -s 'app/**' -x 'app/**/*.md' -o app.zip\n\n",
    "  Strip the leading directory and add an inline file:\n",
    "    $ detzip build -s 'app/**' --strip-components 1 \\\n",
    "        -c 'version.txt=1.0.0' -o app.zip\n\n",
    "  Fingerprint without building:\n",
    "    $ detzip digest -f 'app/**' --json\n",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build a deterministic archive from globs and inline contents.
    Build(BuildArgs),

    /// Fingerprint a file set without building an archive.
    Digest(DigestArgs),
}

/// Arguments for the build command.
#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Base directory patterns are resolved against.
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub base_dir: Utf8PathBuf,

    /// Include glob pattern (repeatable).
    #[arg(short, long = "source", value_name = "PATTERN")]
    pub sources: Vec<String>,

    /// Exclude glob pattern, applied after includes (repeatable).
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub excludes: Vec<String>,

    /// Inline content entry (repeatable).
    #[arg(short, long = "content", value_name = "NAME=TEXT", value_parser = parse_content)]
    pub contents: Vec<(String, String)>,

    /// Path the assembled archive is written to.
    #[arg(short, long, value_name = "FILE")]
    pub output: Utf8PathBuf,

    /// Command line run through the shell before resolution.
    #[arg(long, value_name = "CMDLINE")]
    pub before_build: Option<String>,

    /// Copy the base directory into a temporary staging root first.
    #[arg(long)]
    pub use_temp_dir: bool,

    /// Compression level: -1 default, 0 store, 1-9 deflate effort.
    #[arg(long, value_name = "N", default_value_t = -1, allow_hyphen_values = true)]
    pub compression_level: i32,

    /// Leading path components stripped from every entry name.
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub strip_components: usize,
}

/// Arguments for the digest command.
#[derive(Args, Debug, Clone)]
pub struct DigestArgs {
    /// Base directory patterns are resolved against.
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub base_dir: Utf8PathBuf,

    /// Include glob pattern for files to hash (repeatable).
    #[arg(short, long = "file", value_name = "PATTERN")]
    pub files: Vec<String>,

    /// Exclude glob pattern, applied after includes (repeatable).
    #[arg(short = 'x', long = "exclude", value_name = "PATTERN")]
    pub excludes: Vec<String>,

    /// Inline content entry (repeatable).
    #[arg(short, long = "content", value_name = "NAME=TEXT", value_parser = parse_content)]
    pub contents: Vec<(String, String)>,

    /// Accept include patterns that match nothing.
    #[arg(long)]
    pub allow_missing: bool,

    /// Output the digest map as JSON.
    #[arg(long)]
    pub json: bool,
}

impl BuildArgs {
    /// Convert parsed arguments into a core build request.
    #[must_use]
    pub fn into_request(self) -> BuildRequest {
        BuildRequest {
            base_dir: self.base_dir,
            sources: self.sources,
            excludes: self.excludes,
            contents: self.contents.into_iter().collect(),
            output: self.output,
            before_build: self.before_build,
            use_temp_dir: self.use_temp_dir,
            compression_level: self.compression_level,
            strip_components: self.strip_components,
        }
    }
}

impl DigestArgs {
    /// Convert parsed arguments into a core fingerprint request.
    #[must_use]
    pub fn into_request(self) -> FingerprintRequest {
        FingerprintRequest {
            base_dir: self.base_dir,
            files: self.files,
            excludes: self.excludes,
            contents: self.contents.into_iter().collect(),
            allow_missing: self.allow_missing,
        }
    }
}

/// Parse one `NAME=TEXT` inline content argument.
fn parse_content(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(name, text)| (name.to_owned(), text.to_owned()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=TEXT, got `{value}`"))
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
