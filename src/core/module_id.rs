//! Module identifier ranges of the root image
//!
//! Must match the `MODULE_ID` ranges the firmware uses to locate modules.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LayoutError;

/// Reserved identifier for a firmware image under test
pub const MODULE_FW_TEMPORARY: u32 = 0x1FFF;

/// Identifier range of unassigned modules
pub const MODULE_UNUSED_RANGE: (u32, u32) = (0x6001, 0xFFFF);

/// Category a root image module is added under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleCategory {
    /// GARD platform firmware
    #[serde(alias = "gard")]
    Firmware,
    /// ML network firmware
    Ml,
    /// Camera configuration container
    #[serde(alias = "camera")]
    CameraConfig,
    /// Application profile
    AppProfile,
    /// Application data, 4-byte granular
    AppData,
}

impl ModuleCategory {
    /// All categories, in the order flag-supplied modules are laid out
    pub const FLAG_ORDER: [Self; 5] = [
        Self::Ml,
        Self::AppProfile,
        Self::AppData,
        Self::Firmware,
        Self::CameraConfig,
    ];

    /// Inclusive identifier range of the category
    pub const fn range(self) -> (u32, u32) {
        match self {
            Self::Firmware => (0x1001, 0x1FFE),
            Self::Ml => (0x2001, 0x2FFF),
            Self::CameraConfig => (0x3001, 0x3FFF),
            Self::AppProfile => (0x4001, 0x4FFF),
            Self::AppData => (0x5001, 0x5FFF),
        }
    }

    /// Human readable name used in diagnostics
    pub const fn label(self) -> &'static str {
        match self {
            Self::Firmware => "GARD FW",
            Self::Ml => "ML",
            Self::CameraConfig => "Camera Configuration",
            Self::AppProfile => "App Profile",
            Self::AppData => "App Data",
        }
    }

    /// Whether `identifier` belongs to this category
    pub const fn contains(self, identifier: u32) -> bool {
        let (start, end) = self.range();
        identifier >= start && identifier <= end
    }

    /// Check `identifier` against this category's range
    pub fn validate(self, identifier: u32) -> Result<(), LayoutError> {
        if self.contains(identifier) {
            return Ok(());
        }
        let (start, end) = self.range();
        Err(LayoutError::RangeViolation {
            category: self.label(),
            identifier,
            start,
            end,
        })
    }

    /// Category whose range holds `identifier`, if any
    pub fn classify(identifier: u32) -> Option<Self> {
        Self::FLAG_ORDER.into_iter().find(|c| c.contains(identifier))
    }
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_boundaries() {
        assert!(ModuleCategory::Firmware.contains(0x1001));
        assert!(ModuleCategory::Firmware.contains(0x1FFE));
        assert!(!ModuleCategory::Firmware.contains(MODULE_FW_TEMPORARY));
        assert!(!ModuleCategory::Firmware.contains(0x1000));
        assert!(ModuleCategory::AppData.contains(0x5FFF));
        assert!(!ModuleCategory::AppData.contains(0x6001));
    }

    #[test]
    fn test_validate_reports_range() {
        let err = ModuleCategory::Ml.validate(0x3001).unwrap_err();
        match err {
            LayoutError::RangeViolation {
                identifier,
                start,
                end,
                ..
            } => {
                assert_eq!(identifier, 0x3001);
                assert_eq!((start, end), (0x2001, 0x2FFF));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(ModuleCategory::classify(0x3005), Some(ModuleCategory::CameraConfig));
        assert_eq!(ModuleCategory::classify(0x4001), Some(ModuleCategory::AppProfile));
        assert_eq!(ModuleCategory::classify(MODULE_UNUSED_RANGE.0), None);
        assert_eq!(ModuleCategory::classify(0), None);
    }

    #[test]
    fn test_ranges_are_disjoint() {
        for a in ModuleCategory::FLAG_ORDER {
            for b in ModuleCategory::FLAG_ORDER {
                if a != b {
                    let (sa, ea) = a.range();
                    let (sb, eb) = b.range();
                    assert!(ea < sb || eb < sa, "{a} overlaps {b}");
                }
            }
        }
    }
}
