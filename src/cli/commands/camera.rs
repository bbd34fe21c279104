//! Camera command implementation
//!
//! Implements `gardimage camera` to pack camera configuration commands.

use anyhow::{Context, Result};
use clap::Args;
use std::io::BufWriter;
use std::path::PathBuf;

use super::split_id_file;
use crate::cli::output::OutputConfig;
use crate::core::camera::{CameraConfigBuilder, CommandId, CommandSource};
use crate::core::manifest::CameraManifest;
use crate::core::settings;
use crate::error::ManifestError;
use crate::infra::filesystem;

fn parse_command_arg(value: &str) -> Result<(CommandId, PathBuf), String> {
    let (id, file) = split_id_file(value)?;
    Ok((CommandId::parse(&id), file))
}

/// Arguments of `gardimage camera`
#[derive(Args, Debug, Default)]
pub struct CameraArgs {
    /// Build manifest (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Output file, overrides the manifest
    #[arg(short, long, value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Basic camera settings, e.g. "VendorName=Sony,ModelNo=IMX-219,Interfaces=mipi|i2c"
    #[arg(long, value_name = "SETTINGS")]
    pub basicconf: Option<String>,

    /// Command payload; `.txt` files are transcoded as register scripts
    #[arg(long = "camconfcmnd", value_name = "ID=FILE", value_parser = parse_command_arg)]
    pub commands: Vec<(CommandId, PathBuf)>,
}

/// Execute the camera command
pub fn execute(args: CameraArgs, output: &OutputConfig) -> Result<()> {
    let mut manifest = match &args.manifest {
        Some(path) => CameraManifest::load(path)
            .with_context(|| format!("Failed to load manifest {}", path.display()))?,
        None => CameraManifest::default(),
    };

    let mut info = manifest.basic_info()?;
    if let Some(basicconf) = &args.basicconf {
        settings::apply_camera_settings(&mut info, basicconf)
            .context("Invalid --basicconf settings")?;
    }

    let target = args
        .outfile
        .clone()
        .or_else(|| manifest.output.take())
        .ok_or(ManifestError::MissingOutput)?;

    let temp = filesystem::create_output(&target)?;
    let mut builder = CameraConfigBuilder::new(BufWriter::new(temp), info);

    let commands = manifest
        .commands
        .into_iter()
        .map(|c| (c.id, c.path))
        .chain(args.commands);
    for (id, path) in commands {
        let source = CommandSource::from_path(&path);
        let identifier = builder
            .add_command(&id, source)
            .with_context(|| format!("Failed to add command {id} from {}", path.display()))?;
        tracing::debug!("Queued command {identifier:#06x} from {}", path.display());
    }

    let (writer, report) = builder.finish()?;
    let temp = writer.into_inner().map_err(std::io::IntoInnerError::into_error)?;
    filesystem::persist(temp, &target)?;

    output.report(
        &report,
        &format!(
            "Wrote {} ({} entries, {} bytes)",
            target.display(),
            report.entries.len(),
            report.total_size
        ),
    )
}
