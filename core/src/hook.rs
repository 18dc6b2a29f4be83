//! Pre-build hook execution.
//!
//! The hook is an opaque command line run through the platform shell
//! before resolution; it has no bearing on the determinism of the archive
//! itself, only on side effects (such as `npm install`) that happen
//! before files are globbed. The contract is deliberately small: run the
//! line, return combined stdout and stderr, and report success or
//! failure.

use crate::error::{BuildError, Result};
use camino::Utf8Path;
use log::{debug, info};
use std::process::{Command, Output};

/// Abstraction for running hook command lines, enabling test stubbing.
pub trait CommandExecutor {
    /// Run `command_line` with `current_dir` as the working directory and
    /// return the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning the command.
    fn run(&self, command_line: &str, current_dir: &Utf8Path) -> Result<Output>;
}

/// Executes hook command lines through the platform shell.
///
/// Uses `sh -c` on Unix and `cmd /C` on Windows, so the command line may
/// contain environment assignments, quoting, and redirections in the
/// host shell's dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellExecutor;

impl CommandExecutor for ShellExecutor {
    fn run(&self, command_line: &str, current_dir: &Utf8Path) -> Result<Output> {
        let (shell, flag) = shell_invocation();

        Command::new(shell)
            .arg(flag)
            .arg(command_line)
            .current_dir(current_dir)
            .output()
            .map_err(BuildError::from)
    }
}

/// Platform shell and its "run this string" flag.
fn shell_invocation() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Run the pre-build hook and return its combined output.
///
/// Output is stdout followed by stderr, trimmed, with a trailing newline.
/// On failure the error carries the command line and the combined output
/// (or `(empty)` when the command produced none).
///
/// # Errors
///
/// Returns [`BuildError::Hook`] when the command exits with a failure
/// status, or an I/O error when it cannot be spawned.
pub fn run_hook(
    executor: &dyn CommandExecutor,
    command_line: &str,
    current_dir: &Utf8Path,
) -> Result<String> {
    info!("running pre-build hook `{command_line}`");
    let output = executor.run(command_line, current_dir)?;
    let combined = combined_output(&output);

    if !output.status.success() {
        let trimmed = combined.trim();
        return Err(BuildError::Hook {
            command: command_line.to_owned(),
            output: if trimmed.is_empty() {
                "(empty)".to_owned()
            } else {
                trimmed.to_owned()
            },
        });
    }

    debug!("pre-build hook succeeded");
    Ok(format!("{}\n", combined.trim()))
}

/// Concatenate stdout and stderr into one lossy string.
fn combined_output(output: &Output) -> String {
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}
