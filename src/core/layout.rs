//! Root image layout engine
//!
//! A root image is laid out on erase-block boundaries:
//!
//! ```text
//! 0x0000            configuration header (40 bytes)
//! directory_base    directory copy 0
//! + alignment       directory copy 1 ...
//! + alignment * N   modules, each starting on an alignment boundary
//! ```
//!
//! Directory entry offsets are relative to `directory_base`.

use serde::{Deserialize, Serialize};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::defaults::{
    APP_DATA_GRANULE, CONFIG_ADDRESS, DEFAULT_ALIGNMENT, DEFAULT_BOOT_IDENTIFIER,
    DEFAULT_CONTROL_FIELD, DEFAULT_DIRECTORY_COPIES, DEFAULT_LAYOUT_VERSION, DEFAULT_UPDATE_COUNT,
};
use crate::core::codec::{RootConfigHeader, ROOT_HEADER_SIZE};
use crate::core::directory::DirectoryTable;
use crate::core::module_id::ModuleCategory;
use crate::error::LayoutError;

/// Layout and header settings of one root image build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutSettings {
    /// Module and directory alignment, a power of two
    #[serde(alias = "alignment")]
    pub erase_block_alignment: u32,
    /// Number of directory copies
    pub directory_copies: u32,
    pub layout_version: u32,
    pub update_count: u32,
    pub control_field: u32,
    /// Manual directory base; defaults to `erase_block_alignment`
    pub start_of_directory: Option<u32>,
    /// Module to load first, pinned to directory position 0
    #[serde(alias = "boot_uid")]
    pub boot_identifier: Option<u32>,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            erase_block_alignment: DEFAULT_ALIGNMENT,
            directory_copies: DEFAULT_DIRECTORY_COPIES,
            layout_version: DEFAULT_LAYOUT_VERSION,
            update_count: DEFAULT_UPDATE_COUNT,
            control_field: DEFAULT_CONTROL_FIELD,
            start_of_directory: None,
            boot_identifier: None,
        }
    }
}

/// Round `value` up to the next multiple of `alignment` (a power of two)
pub const fn align_up(value: u64, alignment: u64) -> u64 {
    (value + alignment - 1) & !(alignment - 1)
}

/// Allocation state of one build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutCursor {
    alignment: u64,
    directory_copies: u32,
    directory_base: u64,
    next_module_offset: u64,
}

impl LayoutCursor {
    /// Validate the layout parameters and place the cursor after the last
    /// directory region
    pub fn new(
        alignment: u32,
        directory_copies: u32,
        start_of_directory: Option<u32>,
    ) -> Result<Self, LayoutError> {
        if !alignment.is_power_of_two() {
            return Err(LayoutError::AlignmentViolation {
                message: format!("alignment {alignment:#x} is not a power of two"),
            });
        }
        if directory_copies < 1 {
            return Err(LayoutError::InvalidDirectoryCopies {
                copies: directory_copies,
            });
        }

        let alignment = u64::from(alignment);
        let directory_base = start_of_directory.map_or(alignment, u64::from);
        if directory_base % alignment != 0 {
            return Err(LayoutError::AlignmentViolation {
                message: format!(
                    "start of directory {directory_base:#x} is not a multiple of {alignment:#x}"
                ),
            });
        }
        if directory_base < alignment {
            return Err(LayoutError::AlignmentViolation {
                message: format!(
                    "start of directory {directory_base:#x} overlaps the configuration region ending at {alignment:#x}"
                ),
            });
        }
        if directory_base < ROOT_HEADER_SIZE as u64 {
            return Err(LayoutError::AlignmentViolation {
                message: format!(
                    "directory base {directory_base:#x} is inside the {ROOT_HEADER_SIZE}-byte header"
                ),
            });
        }

        Ok(Self {
            alignment,
            directory_copies,
            directory_base,
            next_module_offset: directory_base + alignment * u64::from(directory_copies),
        })
    }

    pub fn alignment(&self) -> u64 {
        self.alignment
    }

    pub fn directory_copies(&self) -> u32 {
        self.directory_copies
    }

    /// Absolute offset of directory copy 0
    pub fn directory_base(&self) -> u64 {
        self.directory_base
    }

    /// Absolute offset of directory copy `index`
    pub fn directory_region(&self, index: u32) -> u64 {
        self.directory_base + self.alignment * u64::from(index)
    }

    /// Absolute offset the next module is written at
    pub fn next_module_offset(&self) -> u64 {
        self.next_module_offset
    }

    /// Move past a module of `size` bytes to the next alignment boundary
    pub fn advance(&mut self, size: u64) {
        self.next_module_offset = align_up(self.next_module_offset + size, self.alignment);
    }
}

/// Where one module landed in the image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModulePlacement {
    pub category: ModuleCategory,
    pub identifier: u32,
    /// Absolute offset in the image
    pub offset: u64,
    /// Offset recorded in the directory
    pub directory_offset: u32,
    pub size: u32,
}

/// Summary of a finished root image
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub header: RootConfigHeader,
    pub alignment: u64,
    pub directory_base: u64,
    pub image_size: u64,
    pub modules: Vec<ModulePlacement>,
}

/// Builds one root image into a seekable writer
pub struct RootImageBuilder<W: Write + Seek> {
    writer: W,
    settings: LayoutSettings,
    cursor: LayoutCursor,
    directory: DirectoryTable,
    placements: Vec<ModulePlacement>,
    image_end: u64,
}

impl<W: Write + Seek> RootImageBuilder<W> {
    /// Create a builder, rejecting invalid layout settings before any write
    pub fn new(writer: W, settings: LayoutSettings) -> Result<Self, LayoutError> {
        let cursor = LayoutCursor::new(
            settings.erase_block_alignment,
            settings.directory_copies,
            settings.start_of_directory,
        )?;
        debug!(
            "Layout: alignment {:#x}, {} directory copies at {:#x}, modules from {:#x}",
            cursor.alignment(),
            cursor.directory_copies(),
            cursor.directory_base(),
            cursor.next_module_offset()
        );

        Ok(Self {
            writer,
            settings,
            cursor,
            directory: DirectoryTable::new(),
            placements: Vec::new(),
            image_end: 0,
        })
    }

    pub fn cursor(&self) -> &LayoutCursor {
        &self.cursor
    }

    pub fn placements(&self) -> &[ModulePlacement] {
        &self.placements
    }

    /// Add a module from a file
    pub fn add_module(
        &mut self,
        category: ModuleCategory,
        identifier: u32,
        path: &Path,
    ) -> Result<&ModulePlacement, LayoutError> {
        category.validate(identifier)?;
        if !path.is_file() {
            return Err(LayoutError::MissingInput {
                category: category.label(),
                path: path.to_path_buf(),
            });
        }

        let bytes = std::fs::read(path).map_err(|source| LayoutError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        self.add_module_bytes(category, identifier, &bytes)
    }

    /// Add a module from memory.
    ///
    /// Nothing is written unless every check passes.
    pub fn add_module_bytes(
        &mut self,
        category: ModuleCategory,
        identifier: u32,
        bytes: &[u8],
    ) -> Result<&ModulePlacement, LayoutError> {
        category.validate(identifier)?;

        let len = bytes.len() as u64;
        if category == ModuleCategory::AppData && len % APP_DATA_GRANULE != 0 {
            return Err(LayoutError::AlignmentViolation {
                message: format!(
                    "App Data {identifier:#06x} is {len} bytes, not a multiple of {APP_DATA_GRANULE}"
                ),
            });
        }

        let offset = self.cursor.next_module_offset();
        let relative = offset - self.cursor.directory_base();
        let (Ok(directory_offset), Ok(size)) = (u32::try_from(relative), u32::try_from(len)) else {
            return Err(LayoutError::OffsetOverflow { offset });
        };
        if offset + len > 1 << 32 {
            return Err(LayoutError::OffsetOverflow { offset });
        }

        // Registering first rejects duplicates before the payload is written
        self.directory.add_entry(identifier, directory_offset, size)?;

        self.writer
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.writer.write_all(bytes))
            .map_err(LayoutError::Write)?;
        self.image_end = self.image_end.max(offset + len);
        self.cursor.advance(len);

        info!(
            "Placed {} {:#06x} at {:#x} ({} bytes)",
            category, identifier, offset, size
        );

        self.placements.push(ModulePlacement {
            category,
            identifier,
            offset,
            directory_offset,
            size,
        });
        Ok(&self.placements[self.placements.len() - 1])
    }

    pub fn add_gard_firmware(&mut self, id: u32, path: &Path) -> Result<&ModulePlacement, LayoutError> {
        self.add_module(ModuleCategory::Firmware, id, path)
    }

    pub fn add_ml_firmware(&mut self, id: u32, path: &Path) -> Result<&ModulePlacement, LayoutError> {
        self.add_module(ModuleCategory::Ml, id, path)
    }

    pub fn add_camera_configuration(
        &mut self,
        id: u32,
        path: &Path,
    ) -> Result<&ModulePlacement, LayoutError> {
        self.add_module(ModuleCategory::CameraConfig, id, path)
    }

    pub fn add_app_profile(&mut self, id: u32, path: &Path) -> Result<&ModulePlacement, LayoutError> {
        self.add_module(ModuleCategory::AppProfile, id, path)
    }

    pub fn add_app_data(&mut self, id: u32, path: &Path) -> Result<&ModulePlacement, LayoutError> {
        self.add_module(ModuleCategory::AppData, id, path)
    }

    /// Write the header and every directory copy, returning the writer
    pub fn finish(mut self) -> Result<(W, BuildReport), LayoutError> {
        if let Some(boot) = self.settings.boot_identifier {
            if !self.directory.contains(boot) {
                warn!("Boot identifier {boot:#06x} is not in the directory; order unchanged");
            }
        }
        self.directory.set_pinned_identifier(self.settings.boot_identifier);

        let directory = self.directory.serialize();
        let alignment = self.cursor.alignment();
        if directory.len() as u64 > alignment {
            return Err(LayoutError::DirectoryOverflow {
                size: directory.len(),
                alignment: self.settings.erase_block_alignment,
            });
        }

        let directory_base = self.cursor.directory_base();
        let header = RootConfigHeader {
            layout_version: self.settings.layout_version,
            update_count: self.settings.update_count,
            control_field: self.settings.control_field,
            start_of_directory: u32::try_from(directory_base)
                .map_err(|_| LayoutError::OffsetOverflow {
                    offset: directory_base,
                })?,
            size_of_directory: u32::try_from(directory.len()).map_err(|_| {
                LayoutError::DirectoryOverflow {
                    size: directory.len(),
                    alignment: self.settings.erase_block_alignment,
                }
            })?,
            directory_copy_count: self.cursor.directory_copies(),
            boot_identifier: self
                .settings
                .boot_identifier
                .unwrap_or(DEFAULT_BOOT_IDENTIFIER),
            ..RootConfigHeader::default()
        };

        self.writer
            .seek(SeekFrom::Start(CONFIG_ADDRESS))
            .and_then(|_| header.write_to(&mut self.writer))
            .map_err(LayoutError::Write)?;
        self.image_end = self.image_end.max(CONFIG_ADDRESS + ROOT_HEADER_SIZE as u64);

        for copy in 0..self.cursor.directory_copies() {
            let region = self.cursor.directory_region(copy);
            self.writer
                .seek(SeekFrom::Start(region))
                .and_then(|_| self.writer.write_all(&directory))
                .map_err(LayoutError::Write)?;
            self.image_end = self.image_end.max(region + directory.len() as u64);
            debug!("Wrote directory copy {} at {:#x}", copy, region);
        }
        self.writer.flush().map_err(LayoutError::Write)?;

        info!(
            "Root image complete: {} modules, {} byte directory",
            self.placements.len(),
            directory.len()
        );

        let report = BuildReport {
            header,
            alignment,
            directory_base,
            image_size: self.image_end,
            modules: self.placements,
        };
        Ok((self.writer, report))
    }
}
