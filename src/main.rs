//! gardimage CLI - GARD SoM flash image builder
//!
//! Entry point for the gardimage command-line application.

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

use gardimage::cli::output::display_error;
use gardimage::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber; RUST_LOG directives take precedence
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(cli.log_level().into())
                .from_env_lossy(),
        )
        .init();

    match cli.run() {
        Ok(()) => Ok(()),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
