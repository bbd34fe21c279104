//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod camera;
pub mod i2c;
pub mod inspect;
pub mod root;

use anyhow::Result;
use clap::Subcommand;
use std::path::PathBuf;

use crate::cli::output::OutputConfig;
use crate::core::settings::parse_u32;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a root flash image from firmware, ML and configuration modules
    Root(root::RootArgs),

    /// Build a camera configuration container
    Camera(camera::CameraArgs),

    /// Transcode a register script into a binary command blob
    I2c(i2c::I2cArgs),

    /// Decode a root image or camera configuration
    Inspect(inspect::InspectArgs),
}

impl Commands {
    /// Execute the command
    pub fn run(self, output: &OutputConfig) -> Result<()> {
        match self {
            Self::Root(args) => root::execute(args, output),
            Self::Camera(args) => camera::execute(args, output),
            Self::I2c(args) => i2c::execute(&args, output),
            Self::Inspect(args) => inspect::execute(&args, output),
        }
    }
}

/// Parse an integer literal argument
pub fn parse_int_arg(value: &str) -> Result<u32, String> {
    parse_u32(value).ok_or_else(|| format!("'{value}' is not a 32-bit integer"))
}

/// Split an `ID=FILE` argument
pub fn split_id_file(value: &str) -> Result<(String, PathBuf), String> {
    let (id, file) = value
        .split_once('=')
        .ok_or_else(|| format!("'{value}' is not of the form ID=FILE"))?;
    let (id, file) = (id.trim(), file.trim());
    if id.is_empty() || file.is_empty() {
        return Err(format!("'{value}' is not of the form ID=FILE"));
    }
    Ok((id.to_string(), PathBuf::from(file)))
}

/// Parse an `ID=FILE` argument with a numeric identifier
pub fn parse_module_arg(value: &str) -> Result<(u32, PathBuf), String> {
    let (id, file) = split_id_file(value)?;
    Ok((parse_int_arg(&id)?, file))
}
