//! Decode built images for host-side verification

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::defaults::RFS_SIGNATURE;
use crate::core::camera::{command_name, BASIC_CAMERA_CONFIG};
use crate::core::codec::{
    CameraBasicInfo, DirectoryEntry, RootConfigHeader, CAMERA_INFO_SIZE, DIR_ENTRY_FIELD, DIR_ENTRY_SIZE,
    ROOT_HEADER_SIZE,
};
use crate::core::module_id::ModuleCategory;
use crate::error::InspectError;

/// One decoded directory entry with its payload digest
#[derive(Debug, Clone, Serialize)]
pub struct InspectedEntry {
    pub identifier: u32,
    /// Category or command name, when known
    pub kind: Option<String>,
    /// Offset as stored in the directory
    pub offset: u32,
    /// Absolute offset in the file
    pub absolute_offset: u64,
    pub size: u32,
    pub sha256: String,
}

/// Decoded root image
#[derive(Debug, Clone, Serialize)]
pub struct RootImageInfo {
    pub header: RootConfigHeader,
    pub entries: Vec<InspectedEntry>,
}

/// Decoded camera configuration
#[derive(Debug, Clone, Serialize)]
pub struct CameraImageInfo {
    pub info: CameraBasicInfo,
    pub entries: Vec<InspectedEntry>,
}

/// Either kind of decoded file
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Inspection {
    RootImage(RootImageInfo),
    CameraConfig(CameraImageInfo),
}

fn slice(data: &[u8], offset: u64, needed: usize) -> Result<&[u8], InspectError> {
    usize::try_from(offset)
        .ok()
        .and_then(|start| data.get(start..start.checked_add(needed)?))
        .ok_or(InspectError::Truncated {
            offset,
            needed,
            available: data.len(),
        })
}

fn read_entries(data: &[u8], offset: u64, size: u32) -> Result<Vec<DirectoryEntry>, InspectError> {
    if size as usize % DIR_ENTRY_SIZE != 0 {
        return Err(InspectError::RaggedDirectory {
            size,
            entry_size: DIR_ENTRY_FIELD,
        });
    }
    Ok(slice(data, offset, size as usize)?
        .chunks(DIR_ENTRY_SIZE)
        .filter_map(DirectoryEntry::from_bytes)
        .collect())
}

fn digest_entry(
    data: &[u8],
    entry: &DirectoryEntry,
    base: u64,
    kind: Option<String>,
) -> Result<InspectedEntry, InspectError> {
    let absolute_offset = base + u64::from(entry.offset);
    let payload = slice(data, absolute_offset, entry.size as usize).map_err(|_| {
        InspectError::EntryOutOfBounds {
            identifier: entry.identifier,
            offset: absolute_offset,
            size: entry.size,
            len: data.len(),
        }
    })?;

    Ok(InspectedEntry {
        identifier: entry.identifier,
        kind,
        offset: entry.offset,
        absolute_offset,
        size: entry.size,
        sha256: hex::encode(Sha256::digest(payload)),
    })
}

/// Decode a root image and digest every module
pub fn inspect_root(data: &[u8]) -> Result<RootImageInfo, InspectError> {
    let header = RootConfigHeader::from_bytes(slice(data, 0, ROOT_HEADER_SIZE)?)
        .ok_or(InspectError::Truncated {
            offset: 0,
            needed: ROOT_HEADER_SIZE,
            available: data.len(),
        })?;
    if header.signature != RFS_SIGNATURE {
        return Err(InspectError::BadSignature {
            expected: RFS_SIGNATURE,
            found: header.signature,
        });
    }
    if header.directory_entry_size as usize != DIR_ENTRY_SIZE {
        return Err(InspectError::RaggedDirectory {
            size: header.size_of_directory,
            entry_size: header.directory_entry_size,
        });
    }

    let base = u64::from(header.start_of_directory);
    let entries = read_entries(data, base, header.size_of_directory)?
        .iter()
        .map(|entry| {
            let kind = ModuleCategory::classify(entry.identifier).map(|c| c.label().to_string());
            digest_entry(data, entry, base, kind)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RootImageInfo { header, entries })
}

/// Decode a camera configuration file and digest every command
pub fn inspect_camera(data: &[u8]) -> Result<CameraImageInfo, InspectError> {
    // The basic info entry comes first and sits right after the directory
    let first = DirectoryEntry::from_bytes(slice(data, 0, DIR_ENTRY_SIZE)?).ok_or(
        InspectError::Truncated {
            offset: 0,
            needed: DIR_ENTRY_SIZE,
            available: data.len(),
        },
    )?;
    let entries = read_entries(data, 0, first.offset)?;

    let info_bytes = slice(data, u64::from(first.offset), CAMERA_INFO_SIZE)?;
    let info = CameraBasicInfo::from_bytes(info_bytes).ok_or(InspectError::Truncated {
        offset: u64::from(first.offset),
        needed: CAMERA_INFO_SIZE,
        available: data.len(),
    })?;

    let entries = entries
        .iter()
        .map(|entry| {
            let kind = if entry.identifier == BASIC_CAMERA_CONFIG {
                Some("BASIC_CAMERA_CONFIG".to_string())
            } else {
                command_name(entry.identifier).map(str::to_string)
            };
            digest_entry(data, entry, 0, kind)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CameraImageInfo { info, entries })
}

/// Decode a file as a root image when it carries the root signature,
/// otherwise as a camera configuration
pub fn inspect(data: &[u8]) -> Result<Inspection, InspectError> {
    let is_root = data
        .get(..4)
        .is_some_and(|magic| magic == RFS_SIGNATURE.to_le_bytes());
    if is_root {
        inspect_root(data).map(Inspection::RootImage)
    } else {
        inspect_camera(data).map(Inspection::CameraConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::{CameraConfigBuilder, CommandId};
    use crate::core::layout::{LayoutSettings, RootImageBuilder};
    use std::io::Cursor;

    fn root_image() -> Vec<u8> {
        let settings = LayoutSettings {
            erase_block_alignment: 0x100,
            directory_copies: 2,
            ..LayoutSettings::default()
        };
        let mut builder = RootImageBuilder::new(Cursor::new(Vec::new()), settings).unwrap();
        builder
            .add_module_bytes(ModuleCategory::Firmware, 0x1001, b"abc")
            .unwrap();
        builder
            .add_module_bytes(ModuleCategory::AppData, 0x5001, &[0; 8])
            .unwrap();
        builder.finish().unwrap().0.into_inner()
    }

    #[test]
    fn test_inspect_root_image() {
        let image = root_image();
        let Inspection::RootImage(info) = inspect(&image).unwrap() else {
            panic!("expected a root image");
        };

        assert_eq!(info.header.directory_copy_count, 2);
        assert_eq!(info.entries.len(), 2);
        assert_eq!(info.entries[0].absolute_offset, 0x300);
        assert_eq!(info.entries[0].kind.as_deref(), Some("GARD FW"));
        assert_eq!(
            info.entries[0].sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(info.entries[1].absolute_offset, 0x400);
    }

    #[test]
    fn test_inspect_camera_config() {
        let mut builder =
            CameraConfigBuilder::new(Cursor::new(Vec::new()), CameraBasicInfo::default());
        builder
            .add_command_bytes(&CommandId::parse("SET_FPS"), vec![30])
            .unwrap();
        let bytes = builder.finish().unwrap().0.into_inner();

        let Inspection::CameraConfig(info) = inspect(&bytes).unwrap() else {
            panic!("expected a camera configuration");
        };
        assert_eq!(info.info.directory_entry_count, 2);
        assert_eq!(info.entries[1].kind.as_deref(), Some("SET_FPS"));
        assert_eq!(info.entries[1].absolute_offset, 24 + 60);
    }

    #[test]
    fn test_truncated_image() {
        let image = root_image();
        let err = inspect_root(&image[..0x302]).unwrap_err();
        assert!(matches!(
            err,
            InspectError::EntryOutOfBounds { identifier: 0x1001, .. }
        ));

        let err = inspect_root(&image[..20]).unwrap_err();
        assert!(matches!(err, InspectError::Truncated { .. }));
    }

    #[test]
    fn test_bad_signature() {
        let mut image = root_image();
        image[0] = 0;
        let err = inspect_root(&image).unwrap_err();
        assert!(matches!(err, InspectError::BadSignature { .. }));
    }

    #[test]
    fn test_ragged_camera_directory() {
        let mut bytes = DirectoryEntry::new(BASIC_CAMERA_CONFIG, 13, 60).to_bytes().to_vec();
        bytes.resize(100, 0);
        let err = inspect_camera(&bytes).unwrap_err();
        assert!(matches!(err, InspectError::RaggedDirectory { size: 13, .. }));
    }
}
