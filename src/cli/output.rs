//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress bars,
//! status messages, and JSON reports.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";
}

/// How results are presented
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    pub quiet: bool,
    pub json: bool,
}

impl OutputConfig {
    pub fn new(quiet: bool, json: bool) -> Self {
        Self { quiet, json }
    }

    /// Whether human readable output is shown
    pub fn is_interactive(&self) -> bool {
        !self.quiet && !self.json
    }

    /// Print a status line unless quiet or in JSON mode
    pub fn status(&self, prefix: &str, message: &str) {
        if self.is_interactive() {
            println!("{prefix} {message}");
        }
    }

    /// Print a warning to stderr unless in JSON mode
    pub fn warn(&self, message: &str) {
        if !self.json {
            eprintln!("{} {message}", status::WARNING);
        }
    }

    /// Progress bar for module placement, hidden when not interactive
    pub fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.is_interactive() || total == 0 {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(total);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓▒░"));
        }
        pb
    }

    /// Print `report` as JSON, or `summary` as a success line
    pub fn report<T: Serialize>(&self, report: &T, summary: &str) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            self.status(status::SUCCESS, summary);
        }
        Ok(())
    }
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    eprintln!("{} {error}", status::ERROR);
    for cause in error.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
}
