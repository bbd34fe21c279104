//! Root command implementation
//!
//! Implements `gardimage root` to assemble a root flash image.

use anyhow::{Context, Result};
use clap::Args;
use std::io::BufWriter;
use std::path::PathBuf;

use super::{parse_int_arg, parse_module_arg};
use crate::cli::output::OutputConfig;
use crate::core::layout::RootImageBuilder;
use crate::core::manifest::RootManifest;
use crate::core::module_id::ModuleCategory;
use crate::core::settings;
use crate::error::ManifestError;
use crate::infra::filesystem;

/// Arguments of `gardimage root`
#[derive(Args, Debug, Default)]
pub struct RootArgs {
    /// Build manifest (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Output image, overrides the manifest
    #[arg(short, long, value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Root configuration settings, e.g. "UpdateCount=2,UIDOfFirmwareToBoot=0x1002"
    #[arg(long, value_name = "SETTINGS")]
    pub rfsconf: Option<String>,

    /// Module and directory alignment (flash erase block size)
    #[arg(long, value_name = "BYTES", value_parser = parse_int_arg)]
    pub alignment: Option<u32>,

    /// Number of directory copies
    #[arg(long = "dircopies", value_name = "N", value_parser = parse_int_arg)]
    pub directory_copies: Option<u32>,

    /// GARD firmware module
    #[arg(long, value_name = "ID=FILE", value_parser = parse_module_arg)]
    pub gard: Vec<(u32, PathBuf)>,

    /// ML firmware module
    #[arg(long = "mlfile", value_name = "ID=FILE", value_parser = parse_module_arg)]
    pub ml: Vec<(u32, PathBuf)>,

    /// Camera configuration module
    #[arg(long, value_name = "ID=FILE", value_parser = parse_module_arg)]
    pub camconf: Vec<(u32, PathBuf)>,

    /// Application profile module
    #[arg(long, value_name = "ID=FILE", value_parser = parse_module_arg)]
    pub app: Vec<(u32, PathBuf)>,

    /// Application data module (size a multiple of 4)
    #[arg(long, value_name = "ID=FILE", value_parser = parse_module_arg)]
    pub appdata: Vec<(u32, PathBuf)>,
}

impl RootArgs {
    fn flag_modules(&self, category: ModuleCategory) -> &[(u32, PathBuf)] {
        match category {
            ModuleCategory::Firmware => &self.gard,
            ModuleCategory::Ml => &self.ml,
            ModuleCategory::CameraConfig => &self.camconf,
            ModuleCategory::AppProfile => &self.app,
            ModuleCategory::AppData => &self.appdata,
        }
    }
}

/// Execute the root command
pub fn execute(args: RootArgs, output: &OutputConfig) -> Result<()> {
    let mut manifest = match &args.manifest {
        Some(path) => RootManifest::load(path)
            .with_context(|| format!("Failed to load manifest {}", path.display()))?,
        None => RootManifest::default(),
    };

    let mut layout = manifest.effective_layout()?;
    if let Some(alignment) = args.alignment {
        layout.erase_block_alignment = alignment;
    }
    if let Some(copies) = args.directory_copies {
        layout.directory_copies = copies;
    }
    if let Some(rfsconf) = &args.rfsconf {
        settings::apply_root_settings(&mut layout, rfsconf)
            .context("Invalid --rfsconf settings")?;
    }

    let target = args
        .outfile
        .clone()
        .or_else(|| manifest.output.take())
        .ok_or(ManifestError::MissingOutput)?;

    let mut modules: Vec<(ModuleCategory, u32, PathBuf)> = manifest
        .modules
        .into_iter()
        .map(|m| (m.category, m.id, m.path))
        .collect();
    for category in ModuleCategory::FLAG_ORDER {
        modules.extend(
            args.flag_modules(category)
                .iter()
                .map(|(id, path)| (category, *id, path.clone())),
        );
    }
    if modules.is_empty() {
        output.warn("No modules given; the image holds only the header and directory");
    }

    tracing::info!("Building root image {}", target.display());

    let temp = filesystem::create_output(&target)?;
    let mut builder = RootImageBuilder::new(BufWriter::new(temp), layout)?;

    let bar = output.progress_bar(modules.len() as u64);
    for (category, id, path) in &modules {
        bar.set_message(format!("{category} {id:#06x}"));
        builder
            .add_module(*category, *id, path)
            .with_context(|| format!("Failed to add {category} module {id:#06x}"))?;
        bar.inc(1);
    }
    bar.finish_and_clear();

    let (writer, report) = builder.finish()?;
    let temp = writer.into_inner().map_err(std::io::IntoInnerError::into_error)?;
    filesystem::persist(temp, &target)?;

    output.report(
        &report,
        &format!(
            "Wrote {} ({} modules, {} bytes)",
            target.display(),
            report.modules.len(),
            report.image_size
        ),
    )
}
