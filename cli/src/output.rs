//! Output formatting for the detzip CLI.
//!
//! Digest maps render as `hex  name` lines (sha256sum style) or as a
//! JSON object; build results render as a one-line summary.

use detzip_core::BuildOutput;
use std::collections::BTreeMap;

/// Format a digest map for display.
///
/// Keys are already sorted; JSON output preserves that ordering.
#[must_use]
pub fn format_digest_map(map: &BTreeMap<String, String>, json: bool) -> String {
    if json {
        // A string-to-string map always serializes.
        return serde_json::to_string_pretty(map).unwrap_or_default();
    }

    map.iter()
        .map(|(name, hex)| format!("{hex}  {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a one-line summary of a completed build.
#[must_use]
pub fn build_summary(output: &BuildOutput) -> String {
    let entries = output.files.len();
    let plural = if entries == 1 { "entry" } else { "entries" };
    format!(
        "wrote {} ({entries} file {plural}, sha256 {})",
        output.archive_path, output.base64_sha256
    )
}
