//! I2C command implementation
//!
//! Implements `gardimage i2c` to transcode a register script on its own.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use crate::cli::output::OutputConfig;
use crate::core::register_script::{Record, RegisterScript};
use crate::infra::filesystem;

/// Arguments of `gardimage i2c`
#[derive(Args, Debug)]
pub struct I2cArgs {
    /// Register script (text)
    pub input: PathBuf,

    /// Output binary
    #[arg(short, long, value_name = "FILE")]
    pub outfile: PathBuf,
}

#[derive(Serialize)]
struct TranscodeReport<'a> {
    input: &'a std::path::Path,
    output: &'a std::path::Path,
    rows: usize,
    special_records: usize,
    size: usize,
}

/// Execute the i2c command
pub fn execute(args: &I2cArgs, output: &OutputConfig) -> Result<()> {
    let script = RegisterScript::from_file(&args.input)?;
    let bytes = script
        .encode()
        .with_context(|| format!("Failed to transcode {}", args.input.display()))?;

    let mut temp = filesystem::create_output(&args.outfile)?;
    temp.write_all(&bytes)
        .and_then(|()| temp.flush())
        .with_context(|| format!("Failed to write {}", args.outfile.display()))?;
    filesystem::persist(temp, &args.outfile)?;

    let special_records = script
        .records()
        .iter()
        .filter(|r| matches!(r.record, Record::Special { .. }))
        .count();
    let report = TranscodeReport {
        input: &args.input,
        output: &args.outfile,
        rows: script.records().len() - special_records,
        special_records,
        size: bytes.len(),
    };
    output.report(
        &report,
        &format!(
            "Wrote {} ({} rows, {} special records, {} bytes)",
            args.outfile.display(),
            report.rows,
            report.special_records,
            report.size
        ),
    )
}
