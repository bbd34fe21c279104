//! Default configuration values and on-flash constants

/// Root configuration signature ("LSCC" little-endian)
pub const RFS_SIGNATURE: u32 = 0x4343_534C;

/// Default layout version of the configuration and directory
pub const DEFAULT_LAYOUT_VERSION: u32 = 1;

/// Default update counter
pub const DEFAULT_UPDATE_COUNT: u32 = 1;

/// Control field with the "config valid" bit cleared
pub const DEFAULT_CONTROL_FIELD: u32 = 0xFFFF_FFFE;

/// Control field bit that reads 0 when the configuration is valid
pub const CONTROL_CONFIG_VALID_BIT: u32 = 1 << 0;

/// Control field bit that reads 0 when the CRC is valid
pub const CONTROL_CRC_VALID_BIT: u32 = 1 << 1;

/// Default flash erase block alignment (32 KiB)
pub const DEFAULT_ALIGNMENT: u32 = 0x8000;

/// Default number of directory copies
pub const DEFAULT_DIRECTORY_COPIES: u32 = 1;

/// Address of the root configuration header within the image
pub const CONFIG_ADDRESS: u64 = 0;

/// Boot identifier written when none is configured
pub const DEFAULT_BOOT_IDENTIFIER: u32 = 0x1001;

/// App data modules must be a multiple of this many bytes
pub const APP_DATA_GRANULE: u64 = 4;

/// Default camera basic-info layout version
pub const CAMERA_LAYOUT_VERSION: u32 = 1;

/// Default camera vendor name
pub const DEFAULT_VENDOR_NAME: &str = "Lattice";

/// Default camera model name
pub const DEFAULT_MODEL_NAME: &str = "Model 1";

/// Default camera driver version
pub const DEFAULT_DRIVER_VERSION: &str = "1.0.0";
