//! Build manifests (gardimage.toml) for root images and camera configurations
//!
//! Supports environment variable substitution using ${VAR} syntax in any
//! string value. Relative paths resolve against the manifest's directory.
//!
//! ```toml
//! output = "root.bin"
//!
//! [layout]
//! alignment = 0x8000
//! directory_copies = 2
//! boot_identifier = 0x1001
//!
//! [[module]]
//! category = "firmware"
//! id = 0x1001
//! path = "${BUILD_DIR}/gard_fw.bin"
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::defaults::{
    CAMERA_LAYOUT_VERSION, DEFAULT_DRIVER_VERSION, DEFAULT_MODEL_NAME, DEFAULT_VENDOR_NAME,
};
use crate::core::camera::CommandId;
use crate::core::codec::{interface, CameraBasicInfo};
use crate::core::layout::LayoutSettings;
use crate::core::module_id::ModuleCategory;
use crate::core::settings;
use crate::error::ManifestError;

/// Root image manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootManifest {
    /// Output image path
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Layout and header settings
    #[serde(default)]
    pub layout: LayoutSettings,

    /// Settings string applied on top of `layout`
    #[serde(default)]
    pub rfsconf: Option<String>,

    /// Modules in layout order
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleEntry>,
}

/// One module of a root image manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleEntry {
    pub category: ModuleCategory,
    pub id: u32,
    pub path: PathBuf,
}

/// Camera configuration manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CameraManifest {
    /// Output file path
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// Basic camera info
    #[serde(default)]
    pub basic: BasicInfoSection,

    /// Settings string applied on top of `basic`
    #[serde(default)]
    pub basicconf: Option<String>,

    /// Commands in container order
    #[serde(default, rename = "command")]
    pub commands: Vec<CommandEntry>,
}

/// Basic camera info fields of a camera manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasicInfoSection {
    pub layout_version: u32,
    pub vendor_name: String,
    #[serde(alias = "model_no")]
    pub model_name: String,
    pub driver_version: String,
    pub interfaces: Interfaces,
}

impl Default for BasicInfoSection {
    fn default() -> Self {
        Self {
            layout_version: CAMERA_LAYOUT_VERSION,
            vendor_name: DEFAULT_VENDOR_NAME.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            driver_version: DEFAULT_DRIVER_VERSION.to_string(),
            interfaces: Interfaces::default(),
        }
    }
}

/// Interface mask as an integer or a list of names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Interfaces {
    Mask(u32),
    Names(Vec<String>),
}

impl Default for Interfaces {
    fn default() -> Self {
        Self::Mask(0)
    }
}

impl Interfaces {
    pub fn to_mask(&self) -> Result<u32, ManifestError> {
        match self {
            Self::Mask(mask) => Ok(*mask),
            Self::Names(names) => names.iter().try_fold(0, |mask, name| {
                interface::from_name(name)
                    .map(|bit| mask | bit)
                    .ok_or_else(|| ManifestError::InvalidValue {
                        key: "interfaces".to_string(),
                        value: name.clone(),
                    })
            }),
        }
    }
}

/// One command of a camera manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandEntry {
    pub id: CommandId,
    pub path: PathBuf,
}

/// Substitute environment variables in a string.
///
/// Replaces `${VAR_NAME}` patterns with the corresponding environment
/// variable value. Unset variables are replaced with empty strings.
///
/// # Examples
/// ```
/// use gardimage::core::manifest::substitute_env_vars;
///
/// std::env::set_var("GARD_DOC_VAR", "hello");
/// let result = substitute_env_vars("prefix_${GARD_DOC_VAR}_suffix").unwrap();
/// assert_eq!(result, "prefix_hello_suffix");
/// std::env::remove_var("GARD_DOC_VAR");
/// ```
pub fn substitute_env_vars(input: &str) -> Result<String, ManifestError> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| ManifestError::Substitution(format!("Invalid regex: {e}")))?;

    let mut last_end = 0;
    let mut output = String::new();

    for cap in re.captures_iter(input) {
        let Some(full_match) = cap.get(0) else {
            continue;
        };
        output.push_str(&input[last_end..full_match.start()]);
        output.push_str(&std::env::var(&cap[1]).unwrap_or_default());
        last_end = full_match.end();
    }

    output.push_str(&input[last_end..]);
    Ok(output)
}

/// Recursively substitute environment variables in a TOML value
fn substitute_in_value(value: &mut toml::Value) -> Result<(), ManifestError> {
    match value {
        toml::Value::String(s) => {
            *s = substitute_env_vars(s)?;
        }
        toml::Value::Array(arr) => {
            for item in arr.iter_mut() {
                substitute_in_value(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                substitute_in_value(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Parse TOML content, substituting variables before deserializing
fn parse_with_env_substitution<T: serde::de::DeserializeOwned>(
    content: &str,
) -> Result<T, ManifestError> {
    let mut value: toml::Value = toml::from_str(content)?;
    substitute_in_value(&mut value)?;
    Ok(value.try_into::<T>()?)
}

fn read_manifest(path: &Path) -> Result<String, ManifestError> {
    std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn manifest_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new("."))
}

fn resolve(base: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base.join(&*path);
    }
}

impl RootManifest {
    /// Load a manifest, substituting variables and resolving relative paths
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let mut manifest = Self::from_toml(&read_manifest(path)?)?;
        manifest.resolve_paths(manifest_dir(path));
        Ok(manifest)
    }

    /// Parse manifest TOML without touching the filesystem
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        parse_with_env_substitution(content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Make relative paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(output) = self.output.as_mut() {
            resolve(base, output);
        }
        for module in &mut self.modules {
            resolve(base, &mut module.path);
        }
    }

    /// Layout settings with `rfsconf` applied
    pub fn effective_layout(&self) -> Result<LayoutSettings, ManifestError> {
        let mut layout = self.layout.clone();
        if let Some(rfsconf) = &self.rfsconf {
            settings::apply_root_settings(&mut layout, rfsconf)?;
        }
        Ok(layout)
    }
}

impl CameraManifest {
    /// Load a manifest, substituting variables and resolving relative paths
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let mut manifest = Self::from_toml(&read_manifest(path)?)?;
        manifest.resolve_paths(manifest_dir(path));
        Ok(manifest)
    }

    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        parse_with_env_substitution(content)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(output) = self.output.as_mut() {
            resolve(base, output);
        }
        for command in &mut self.commands {
            resolve(base, &mut command.path);
        }
    }

    /// Basic camera info with `basicconf` applied
    pub fn basic_info(&self) -> Result<CameraBasicInfo, ManifestError> {
        let mut info = CameraBasicInfo {
            layout_version: self.basic.layout_version,
            vendor_name: self.basic.vendor_name.clone(),
            model_name: self.basic.model_name.clone(),
            driver_version: self.basic.driver_version.clone(),
            directory_entry_count: 0,
            interfaces: self.basic.interfaces.to_mask()?,
        };
        if let Some(basicconf) = &self.basicconf {
            settings::apply_camera_settings(&mut info, basicconf)?;
        }
        Ok(info)
    }
}
