//! `Key=Value` settings strings and integer literals
//!
//! Both builders accept their header settings as a comma separated list such
//! as `LayoutVersion=1,UpdateCount=4,UIDOfFirmwareToBoot=0x1001`. Keys are
//! case-insensitive.

use crate::config::defaults::{CONTROL_CONFIG_VALID_BIT, CONTROL_CRC_VALID_BIT};
use crate::core::codec::{interface, CameraBasicInfo};
use crate::core::layout::LayoutSettings;
use crate::error::ManifestError;

/// Parse an unsigned integer literal.
///
/// Accepts `0x`, `0o` and `0b` prefixes (any case) and plain decimal.
/// Decimal literals with a leading zero are rejected, so `010` is an error
/// rather than eight or ten. Underscores between digits are permitted.
pub fn parse_int(value: &str) -> Option<u64> {
    let t = value.trim();
    let t = t.strip_prefix('+').unwrap_or(t);

    let (radix, digits) = match t.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => (16, &t[2..]),
        Some("0o") => (8, &t[2..]),
        Some("0b") => (2, &t[2..]),
        _ => (10, t),
    };

    let digits = digits.strip_prefix('_').filter(|_| radix != 10).unwrap_or(digits);
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }

    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    if radix == 10 && cleaned.len() > 1 && cleaned.starts_with('0') && cleaned.chars().any(|c| c != '0')
    {
        return None;
    }

    u64::from_str_radix(&cleaned, radix).ok()
}

/// Parse an integer literal that must fit in 32 bits
pub fn parse_u32(value: &str) -> Option<u32> {
    parse_int(value).and_then(|v| u32::try_from(v).ok())
}

/// Split a settings string into lowercased keys and trimmed values
fn items(settings: &str) -> Result<Vec<(String, String)>, ManifestError> {
    settings
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let (key, value) = item.split_once('=').ok_or_else(|| ManifestError::MalformedSetting {
                item: item.to_string(),
            })?;
            Ok((key.trim().to_ascii_lowercase(), value.trim().to_string()))
        })
        .collect()
}

fn int_value(key: &str, value: &str) -> Result<u32, ManifestError> {
    parse_u32(value).ok_or_else(|| ManifestError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Apply a control field flag name or integer to `control_field`
pub fn apply_control_flag(control_field: u32, value: &str) -> Option<u32> {
    if let Some(raw) = parse_u32(value) {
        return Some(raw);
    }
    match value.trim().to_ascii_lowercase().as_str() {
        "config-valid" => Some(control_field & !CONTROL_CONFIG_VALID_BIT),
        "config-not-valid" => Some(control_field | CONTROL_CONFIG_VALID_BIT),
        "crc-valid" => Some(control_field & !CONTROL_CRC_VALID_BIT),
        "crc-not-valid" => Some(control_field | CONTROL_CRC_VALID_BIT),
        _ => None,
    }
}

/// Apply a root configuration settings string onto `settings`.
///
/// Supported keys: `LayoutVersion`, `UpdateCount`, `ControlField`,
/// `StartOfDirectory` and `UIDOfFirmwareToBoot`. Directory size and entry
/// fields are derived from the build and cannot be set.
pub fn apply_root_settings(settings: &mut LayoutSettings, input: &str) -> Result<(), ManifestError> {
    for (key, value) in items(input)? {
        match key.as_str() {
            "layoutversion" => settings.layout_version = int_value(&key, &value)?,
            "updatecount" => settings.update_count = int_value(&key, &value)?,
            "controlfield" => {
                settings.control_field = apply_control_flag(settings.control_field, &value)
                    .ok_or_else(|| ManifestError::InvalidValue {
                        key: key.clone(),
                        value: value.clone(),
                    })?;
            }
            "startofdirectory" => settings.start_of_directory = Some(int_value(&key, &value)?),
            "uidoffirmwaretoboot" => settings.boot_identifier = Some(int_value(&key, &value)?),
            _ => {
                return Err(ManifestError::UnknownKey {
                    section: "rfs configuration",
                    key,
                })
            }
        }
    }
    Ok(())
}

/// Apply interface names or an integer mask onto `interfaces`.
///
/// An integer replaces the mask; names such as `mipi | i2c` are OR-ed in.
pub fn apply_interfaces(interfaces: u32, value: &str) -> Option<u32> {
    if let Some(raw) = parse_u32(value) {
        return Some(raw);
    }
    value
        .split('|')
        .try_fold(interfaces, |mask, name| interface::from_name(name).map(|bit| mask | bit))
}

/// Apply a camera basic configuration settings string onto `info`.
///
/// Supported keys: `LayoutVersion`, `VendorName`, `ModelNo`, `DriverVersion`
/// and `Interfaces`.
pub fn apply_camera_settings(info: &mut CameraBasicInfo, input: &str) -> Result<(), ManifestError> {
    for (key, value) in items(input)? {
        match key.as_str() {
            "layoutversion" => info.layout_version = int_value(&key, &value)?,
            "vendorname" => info.vendor_name = value,
            "modelno" => info.model_name = value,
            "driverversion" => info.driver_version = value,
            "interfaces" | "interface" => {
                info.interfaces = apply_interfaces(info.interfaces, &value).ok_or_else(|| {
                    ManifestError::InvalidValue {
                        key: key.clone(),
                        value: value.clone(),
                    }
                })?;
            }
            _ => {
                return Err(ManifestError::UnknownKey {
                    section: "basic configuration",
                    key,
                })
            }
        }
    }
    Ok(())
}
