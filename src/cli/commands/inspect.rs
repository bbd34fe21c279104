//! Inspect command implementation
//!
//! Implements `gardimage inspect` to print the layout of a built file.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::OutputConfig;
use crate::core::inspect::{self, InspectedEntry, Inspection};
use crate::infra::filesystem;

/// Arguments of `gardimage inspect`
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Root image or camera configuration file
    pub file: PathBuf,
}

fn print_entries(entries: &[InspectedEntry]) {
    println!(
        "  {:<8} {:<22} {:>10} {:>10}  sha256",
        "id", "kind", "offset", "size"
    );
    for entry in entries {
        println!(
            "  {:#06x}   {:<22} {:>#10x} {:>10}  {}",
            entry.identifier,
            entry.kind.as_deref().unwrap_or("-"),
            entry.absolute_offset,
            entry.size,
            entry.sha256
        );
    }
}

/// Execute the inspect command
pub fn execute(args: &InspectArgs, output: &OutputConfig) -> Result<()> {
    let data = filesystem::read_bytes(&args.file)?;
    let inspection = inspect::inspect(&data)
        .with_context(|| format!("Failed to decode {}", args.file.display()))?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&inspection)?);
        return Ok(());
    }

    match &inspection {
        Inspection::RootImage(image) => {
            let h = &image.header;
            println!("Root image {}", args.file.display());
            println!("  layout version      {}", h.layout_version);
            println!("  update count        {}", h.update_count);
            println!("  control field       {:#010x}", h.control_field);
            println!("  start of directory  {:#x}", h.start_of_directory);
            println!("  size of directory   {}", h.size_of_directory);
            println!("  directory copies    {}", h.directory_copy_count);
            println!("  boot identifier     {:#06x}", h.boot_identifier);
            print_entries(&image.entries);
        }
        Inspection::CameraConfig(camera) => {
            let info = &camera.info;
            println!("Camera configuration {}", args.file.display());
            println!("  layout version  {}", info.layout_version);
            println!("  vendor          {}", info.vendor_name);
            println!("  model           {}", info.model_name);
            println!("  driver version  {}", info.driver_version);
            println!("  entries         {}", info.directory_entry_count);
            println!("  interfaces      {:#x}", info.interfaces);
            print_entries(&camera.entries);
        }
    }
    Ok(())
}
