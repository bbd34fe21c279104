//! Fixed-width little-endian records shared by both container formats
//!
//! Every record here has a byte-exact layout the firmware depends on:
//!
//! - [`DirectoryEntry`] - 12 bytes: identifier, offset, size
//! - [`RootConfigHeader`] - 40 bytes: ten `u32` fields
//! - [`CameraBasicInfo`] - 60 bytes: `u32`, three 16-byte names, two `u32`

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;
use std::io::{self, Write};

use crate::config::defaults::{
    CAMERA_LAYOUT_VERSION, DEFAULT_BOOT_IDENTIFIER, DEFAULT_CONTROL_FIELD, DEFAULT_DRIVER_VERSION,
    DEFAULT_LAYOUT_VERSION, DEFAULT_MODEL_NAME, DEFAULT_UPDATE_COUNT, DEFAULT_VENDOR_NAME,
    RFS_SIGNATURE,
};

/// Encoded size of a directory entry
pub const DIR_ENTRY_SIZE: usize = 12;

/// [`DIR_ENTRY_SIZE`] as stored in 32-bit header fields
#[allow(clippy::cast_possible_truncation)]
pub const DIR_ENTRY_FIELD: u32 = DIR_ENTRY_SIZE as u32;

/// Encoded size of the root configuration header
pub const ROOT_HEADER_SIZE: usize = 40;

/// Encoded size of the camera basic-info record
pub const CAMERA_INFO_SIZE: usize = 60;

/// Width of a null-padded name field
pub const NAME_FIELD_LEN: usize = 16;

/// Encode a string into a null-padded name field.
///
/// At most 15 bytes of UTF-8 are kept so the field always ends in a
/// terminator. Longer input is truncated without error, possibly in the
/// middle of a multi-byte character.
pub fn pad_name(value: &str) -> [u8; NAME_FIELD_LEN] {
    let mut field = [0u8; NAME_FIELD_LEN];
    let bytes = value.as_bytes();
    let len = bytes.len().min(NAME_FIELD_LEN - 1);
    field[..len].copy_from_slice(&bytes[..len]);
    field
}

/// Decode a null-padded name field up to its first terminator
pub fn unpad_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

/// One (identifier, offset, size) directory record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Module or command identifier
    pub identifier: u32,
    /// Offset from the owning container's directory base
    pub offset: u32,
    /// Payload size in bytes
    pub size: u32,
}

impl DirectoryEntry {
    /// Create a new entry
    pub const fn new(identifier: u32, offset: u32, size: u32) -> Self {
        Self {
            identifier,
            offset,
            size,
        }
    }

    /// Write the 12-byte encoding
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Encode into a fixed array
    pub fn to_bytes(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut buf = [0u8; DIR_ENTRY_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.identifier);
        LittleEndian::write_u32(&mut buf[4..8], self.offset);
        LittleEndian::write_u32(&mut buf[8..12], self.size);
        buf
    }

    /// Decode from the first 12 bytes of `data`, `None` if too short
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let data = data.get(..DIR_ENTRY_SIZE)?;
        Some(Self {
            identifier: LittleEndian::read_u32(&data[0..4]),
            offset: LittleEndian::read_u32(&data[4..8]),
            size: LittleEndian::read_u32(&data[8..12]),
        })
    }
}

/// Run-time configuration header at the start of a root image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RootConfigHeader {
    pub signature: u32,
    pub layout_version: u32,
    pub update_count: u32,
    /// Never computed; always encoded as 0
    pub crc: u32,
    pub control_field: u32,
    pub start_of_directory: u32,
    pub size_of_directory: u32,
    pub directory_copy_count: u32,
    pub directory_entry_size: u32,
    pub boot_identifier: u32,
}

impl Default for RootConfigHeader {
    fn default() -> Self {
        Self {
            signature: RFS_SIGNATURE,
            layout_version: DEFAULT_LAYOUT_VERSION,
            update_count: DEFAULT_UPDATE_COUNT,
            crc: 0,
            control_field: DEFAULT_CONTROL_FIELD,
            start_of_directory: 0,
            size_of_directory: 0,
            directory_copy_count: 1,
            directory_entry_size: DIR_ENTRY_FIELD,
            boot_identifier: DEFAULT_BOOT_IDENTIFIER,
        }
    }
}

impl RootConfigHeader {
    /// Write the 40-byte encoding
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Encode into a fixed array; the CRC field is always 0
    pub fn to_bytes(&self) -> [u8; ROOT_HEADER_SIZE] {
        let fields = [
            self.signature,
            self.layout_version,
            self.update_count,
            0,
            self.control_field,
            self.start_of_directory,
            self.size_of_directory,
            self.directory_copy_count,
            self.directory_entry_size,
            self.boot_identifier,
        ];
        let mut buf = [0u8; ROOT_HEADER_SIZE];
        LittleEndian::write_u32_into(&fields, &mut buf);
        buf
    }

    /// Decode from the first 40 bytes of `data`, `None` if too short
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let data = data.get(..ROOT_HEADER_SIZE)?;
        let field = |i: usize| LittleEndian::read_u32(&data[i * 4..i * 4 + 4]);
        Some(Self {
            signature: field(0),
            layout_version: field(1),
            update_count: field(2),
            crc: field(3),
            control_field: field(4),
            start_of_directory: field(5),
            size_of_directory: field(6),
            directory_copy_count: field(7),
            directory_entry_size: field(8),
            boot_identifier: field(9),
        })
    }
}

/// Camera interface bits of [`CameraBasicInfo::interfaces`]
pub mod interface {
    pub const MIPI: u32 = 0x1;
    pub const I2C: u32 = 0x2;
    pub const GPIO: u32 = 0x4;

    /// Look up an interface bit by its (case-insensitive) name
    pub fn from_name(name: &str) -> Option<u32> {
        match name.trim().to_ascii_lowercase().as_str() {
            "mipi" => Some(MIPI),
            "i2c" => Some(I2C),
            "gpio" => Some(GPIO),
            _ => None,
        }
    }
}

/// Basic information record stored first in a camera configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraBasicInfo {
    pub layout_version: u32,
    pub vendor_name: String,
    pub model_name: String,
    pub driver_version: String,
    /// Filled in by the container builder
    pub directory_entry_count: u32,
    /// Bitmask of [`interface`] values
    pub interfaces: u32,
}

impl Default for CameraBasicInfo {
    fn default() -> Self {
        Self {
            layout_version: CAMERA_LAYOUT_VERSION,
            vendor_name: DEFAULT_VENDOR_NAME.to_string(),
            model_name: DEFAULT_MODEL_NAME.to_string(),
            driver_version: DEFAULT_DRIVER_VERSION.to_string(),
            directory_entry_count: 0,
            interfaces: 0,
        }
    }
}

impl CameraBasicInfo {
    /// Write the 60-byte encoding
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Encode into a fixed array
    pub fn to_bytes(&self) -> [u8; CAMERA_INFO_SIZE] {
        let mut buf = [0u8; CAMERA_INFO_SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.layout_version);
        buf[4..20].copy_from_slice(&pad_name(&self.vendor_name));
        buf[20..36].copy_from_slice(&pad_name(&self.model_name));
        buf[36..52].copy_from_slice(&pad_name(&self.driver_version));
        LittleEndian::write_u32(&mut buf[52..56], self.directory_entry_count);
        LittleEndian::write_u32(&mut buf[56..60], self.interfaces);
        buf
    }

    /// Decode from the first 60 bytes of `data`, `None` if too short
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        let data = data.get(..CAMERA_INFO_SIZE)?;
        Some(Self {
            layout_version: LittleEndian::read_u32(&data[0..4]),
            vendor_name: unpad_name(&data[4..20]),
            model_name: unpad_name(&data[20..36]),
            driver_version: unpad_name(&data[36..52]),
            directory_entry_count: LittleEndian::read_u32(&data[52..56]),
            interfaces: LittleEndian::read_u32(&data[56..60]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_entry_layout() {
        let entry = DirectoryEntry::new(0x1001, 0x8000, 0x1234);
        assert_eq!(
            entry.to_bytes(),
            [0x01, 0x10, 0, 0, 0x00, 0x80, 0, 0, 0x34, 0x12, 0, 0]
        );

        let mut written = Vec::new();
        entry.write_to(&mut written).unwrap();
        assert_eq!(written, entry.to_bytes());
        assert_eq!(DirectoryEntry::from_bytes(&written), Some(entry));
    }

    #[test]
    fn test_directory_entry_short_input() {
        assert_eq!(DirectoryEntry::from_bytes(&[0u8; 11]), None);
    }

    #[test]
    fn test_root_header_defaults_and_layout() {
        let header = RootConfigHeader {
            start_of_directory: 0x8000,
            size_of_directory: 24,
            ..RootConfigHeader::default()
        };
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), ROOT_HEADER_SIZE);
        assert_eq!(&bytes[0..4], &[0x4C, 0x53, 0x43, 0x43]);
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
        assert_eq!(&bytes[16..20], &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[20..24], &[0x00, 0x80, 0, 0]);
        assert_eq!(&bytes[32..36], &[12, 0, 0, 0]);
        assert_eq!(&bytes[36..40], &[0x01, 0x10, 0, 0]);
    }

    #[test]
    fn test_root_header_crc_always_zero() {
        let header = RootConfigHeader {
            crc: 0xDEAD_BEEF,
            ..RootConfigHeader::default()
        };
        assert_eq!(&header.to_bytes()[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_pad_name_truncates_to_fifteen_bytes() {
        let field = pad_name("ABCDEFGHIJKLMNOPQRS");
        assert_eq!(&field[..15], b"ABCDEFGHIJKLMNO");
        assert_eq!(field[15], 0);

        let short = pad_name("Sony");
        assert_eq!(&short[..4], b"Sony");
        assert!(short[4..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_camera_info_layout() {
        let info = CameraBasicInfo {
            vendor_name: "Sony".to_string(),
            model_name: "IMX-219".to_string(),
            driver_version: "3.23.04".to_string(),
            directory_entry_count: 3,
            interfaces: interface::MIPI | interface::I2C,
            ..CameraBasicInfo::default()
        };
        let bytes = info.to_bytes();

        assert_eq!(bytes.len(), CAMERA_INFO_SIZE);
        assert_eq!(&bytes[0..4], &[1, 0, 0, 0]);
        assert_eq!(&bytes[4..8], b"Sony");
        assert_eq!(&bytes[20..27], b"IMX-219");
        assert_eq!(&bytes[36..43], b"3.23.04");
        assert_eq!(&bytes[52..56], &[3, 0, 0, 0]);
        assert_eq!(&bytes[56..60], &[3, 0, 0, 0]);
        assert_eq!(CameraBasicInfo::from_bytes(&bytes), Some(info));
    }

    #[test]
    fn test_interface_names() {
        assert_eq!(interface::from_name("MIPI"), Some(interface::MIPI));
        assert_eq!(interface::from_name(" i2c "), Some(interface::I2C));
        assert_eq!(interface::from_name("gpio"), Some(interface::GPIO));
        assert_eq!(interface::from_name("spi"), None);
    }
}
