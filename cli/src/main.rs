//! detzip CLI entrypoint.
//!
//! Parses arguments, runs the requested pipeline operation, and prints a
//! build summary or digest map. Errors are printed to stderr verbatim
//! with a non-zero exit code; the core names the offending pattern or
//! path in the message.

mod cli;
mod output;

use clap::Parser;
use cli::{Cli, Command};
use detzip_core::{Result, pipeline};
use std::io::Write;

fn main() {
    env_logger::init();

    let parsed = Cli::parse();
    let mut stdout = std::io::stdout();

    if let Err(e) = run(parsed, &mut stdout) {
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "error: {e}");

        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            let _ = writeln!(stderr, "  caused by: {cause}");
            source = cause.source();
        }

        std::process::exit(1);
    }
}

/// Dispatch the parsed command and write its report to `stdout`.
fn run(parsed: Cli, stdout: &mut dyn Write) -> Result<()> {
    match parsed.command {
        Command::Build(args) => {
            let built = pipeline::build(&args.into_request())?;
            writeln!(stdout, "{}", output::build_summary(&built))?;
        }
        Command::Digest(args) => {
            let json = args.json;
            let map = pipeline::fingerprint(&args.into_request())?;
            writeln!(stdout, "{}", output::format_digest_map(&map, json))?;
        }
    }

    Ok(())
}
