//! Glob-based path-set resolution.
//!
//! Expands include patterns against an explicit base directory into a
//! deduplicated set of relative file paths, then removes paths matched by
//! exclude patterns. The result is sorted by byte-wise ordering of the
//! path string, independent of filesystem iteration order, OS, or locale;
//! callers rely on that ordering for deterministic archiving and hashing.
//!
//! The dialect is the `glob` crate's: `*`, `?`, `[...]`, and recursive
//! `**`. Dotfiles are matched. Patterns are always interpreted relative
//! to the base directory; no process-wide working-directory state is
//! touched, so concurrent builds in one process cannot interfere.

use crate::error::{BuildError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use std::collections::BTreeSet;

/// Ordered include and exclude glob patterns for one resolution.
///
/// Excludes are always applied after includes; overlap between the two
/// lists carries no special meaning.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    /// Include patterns, expanded and unioned.
    pub includes: Vec<String>,
    /// Exclude patterns, expanded and subtracted from the include set.
    pub excludes: Vec<String>,
}

impl PatternSet {
    /// Build a pattern set from include and exclude pattern lists.
    #[must_use]
    pub fn new<I, S>(includes: I, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            includes: includes.into_iter().map(Into::into).collect(),
            excludes: excludes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolve a pattern set against `base_dir` into sorted relative paths.
///
/// Only regular files are returned; directories and other non-regular
/// entries are silently dropped. When `fail_on_missing_pattern` is true,
/// an include pattern with zero file matches is an error naming the
/// pattern. Exclude patterns never fail on no-match, regardless of the
/// flag. Returned paths use `/` separators on every OS.
///
/// # Errors
///
/// Returns [`BuildError::PatternSyntax`] for a malformed pattern,
/// [`BuildError::PatternNotFound`] in strict mode, and
/// [`BuildError::Read`] when filesystem traversal fails; partial results
/// are discarded.
pub fn resolve(
    base_dir: &Utf8Path,
    patterns: &PatternSet,
    fail_on_missing_pattern: bool,
) -> Result<Vec<String>> {
    let mut set = BTreeSet::new();

    for pattern in &patterns.includes {
        let matches = expand(base_dir, pattern)?;
        trace!("pattern `{pattern}` matched {} files", matches.len());

        if matches.is_empty() && fail_on_missing_pattern {
            return Err(BuildError::PatternNotFound {
                pattern: pattern.clone(),
            });
        }

        set.extend(matches);
    }

    for pattern in &patterns.excludes {
        for path in expand(base_dir, pattern)? {
            set.remove(&path);
        }
    }

    debug!("resolved {} files under {base_dir}", set.len());
    Ok(set.into_iter().collect())
}

/// Expand one pattern beneath `base_dir`, returning relative file paths.
fn expand(base_dir: &Utf8Path, pattern: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for anchored in anchored_patterns(base_dir, pattern) {
        let paths = glob::glob(&anchored).map_err(|e| BuildError::PatternSyntax {
            pattern: pattern.to_owned(),
            reason: e.to_string(),
        })?;

        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                BuildError::Read {
                    path: Utf8PathBuf::from_path_buf(path.clone())
                        .unwrap_or_else(|_| Utf8PathBuf::from(path.to_string_lossy().into_owned())),
                    source: e.into_error(),
                }
            })?;

            // Symlinks to files count as regular files; directories and
            // symlinks to directories do not.
            if !path.is_file() {
                continue;
            }

            let utf8 = Utf8PathBuf::from_path_buf(path)
                .map_err(|p| BuildError::NonUtf8Path { path: p })?;
            files.push(relative_name(base_dir, &utf8));
        }
    }

    Ok(files)
}

/// Join `pattern` under `base_dir`, escaping glob metacharacters in the
/// base so a literal `[` or `*` in the directory name cannot change the
/// pattern's meaning.
///
/// A terminal `**` component walks directories only in this dialect, so a
/// pattern ending in `**` gets a second variant with a trailing `*` that
/// reaches the files at every depth. The two variants are unioned; the
/// caller's file-only filter drops the directory matches.
fn anchored_patterns(base_dir: &Utf8Path, pattern: &str) -> Vec<String> {
    let escaped = glob::Pattern::escape(base_dir.as_str());
    let trimmed = escaped.trim_end_matches(std::path::MAIN_SEPARATOR);
    let sep = std::path::MAIN_SEPARATOR;
    let anchored = format!("{trimmed}{sep}{pattern}");

    if pattern == "**" || pattern.ends_with("/**") {
        let descend = format!("{anchored}{sep}*");
        vec![anchored, descend]
    } else {
        vec![anchored]
    }
}

/// Strip `base_dir` from a match and normalise separators to `/`.
fn relative_name(base_dir: &Utf8Path, path: &Utf8Path) -> String {
    let rel = path.strip_prefix(base_dir).unwrap_or(path);

    if std::path::MAIN_SEPARATOR == '/' {
        rel.as_str().to_owned()
    } else {
        rel.as_str().replace(std::path::MAIN_SEPARATOR, "/")
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
