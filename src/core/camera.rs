//! Camera configuration container
//!
//! A camera configuration file is a directory followed by its payloads,
//! packed back to back:
//!
//! ```text
//! 0x0000         directory, (1 + commands) * 12 bytes
//! dir_size       basic camera info (60 bytes), BASIC_CAMERA_CONFIG
//! dir_size + 60  command payloads in insertion order
//! ```
//!
//! Offsets in the directory are absolute within the file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::codec::{CameraBasicInfo, DirectoryEntry, DIR_ENTRY_FIELD, DIR_ENTRY_SIZE};
use crate::core::directory::DirectoryTable;
use crate::core::register_script;
use crate::core::settings::parse_u32;
use crate::error::{CameraConfigError, DirectoryError};

/// Directory identifier of the basic camera info record
pub const BASIC_CAMERA_CONFIG: u32 = 0x1001;

const COMMAND_PREFIX: &str = "CAM_CFG_CMND_";

/// Symbolic camera command identifiers
pub const COMMAND_TABLE: &[(&str, u32)] = &[
    ("BASIC_CAMERA_CONFIG", BASIC_CAMERA_CONFIG),
    ("START_STREAM", 0x1011),
    ("STOP_STREAM", 0x1012),
    ("SET_FPS", 0x1013),
    ("WHITE_BALANCE", 0x1014),
    ("SET_EXPOSURE", 0x1015),
    ("SET_AUTO_FOCUS", 0x1016),
    ("SET_GAIN", 0x1016),
    ("SET_CONTRAST", 0x1017),
    ("SET_BRIGHTNESS", 0x1018),
    ("SET_SATURATION", 0x1019),
    ("SET_SHARPNESS", 0x101A),
    ("SET_HUE", 0x101B),
    ("SET_AUTO_EXPOSURE", 0x101C),
    ("SET_AUTO_WHITE_BALANCE", 0x101D),
    ("SET_AUTO_GAIN", 0x101F),
    ("SET_AUTO_BRIGHTNESS", 0x1020),
    ("SET_AUTO_CONTRAST", 0x1021),
    ("SET_AUTO_SATURATION", 0x1022),
    ("SET_AUTO_SHARPNESS", 0x1023),
    ("SET_AUTO_HUE", 0x1024),
    ("LAST_VALID_CMND", 0xEFFF),
    ("DEVELOPER_START", 0xF000),
    ("DEVELOPER_END", 0xFFFF),
];

/// Look up a command name, with or without the `CAM_CFG_CMND_` prefix.
///
/// Spaces become underscores and case is ignored, so `"White Balance"`
/// resolves.
pub fn lookup_command(name: &str) -> Option<u32> {
    let normalized = name.trim().replace(' ', "_").to_ascii_uppercase();
    let key = normalized
        .strip_prefix(COMMAND_PREFIX)
        .unwrap_or(&normalized);
    COMMAND_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, value)| *value)
}

/// First table name for a command value
pub fn command_name(value: u32) -> Option<&'static str> {
    COMMAND_TABLE
        .iter()
        .find(|(_, v)| *v == value)
        .map(|(name, _)| *name)
}

/// Command identifier as given by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandId {
    Numeric(u32),
    Named(String),
}

impl CommandId {
    /// Interpret text as an integer literal, falling back to a name
    pub fn parse(text: &str) -> Self {
        parse_u32(text).map_or_else(|| Self::Named(text.trim().to_string()), Self::Numeric)
    }

    /// Resolve to the numeric identifier written to the directory
    pub fn resolve(&self) -> Result<u32, CameraConfigError> {
        match self {
            Self::Numeric(value) => Ok(*value),
            Self::Named(name) => parse_u32(name)
                .or_else(|| lookup_command(name))
                .ok_or_else(|| CameraConfigError::UnknownCommand { name: name.clone() }),
        }
    }
}

impl From<u32> for CommandId {
    fn from(value: u32) -> Self {
        Self::Numeric(value)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value:#06x}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// Where a command payload comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSource {
    /// Copied verbatim
    Binary(PathBuf),
    /// Text register script, transcoded before packing
    RegisterScript(PathBuf),
}

impl CommandSource {
    /// Classify by extension: `.txt` files are register scripts
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_script = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if is_script {
            Self::RegisterScript(path)
        } else {
            Self::Binary(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Binary(path) | Self::RegisterScript(path) => path,
        }
    }

    /// Produce the payload bytes
    pub fn load(&self) -> Result<Vec<u8>, CameraConfigError> {
        let path = self.path();
        if !path.is_file() {
            return Err(CameraConfigError::MissingInput {
                path: path.to_path_buf(),
            });
        }
        match self {
            Self::Binary(path) => std::fs::read(path).map_err(|source| CameraConfigError::Read {
                path: path.clone(),
                source,
            }),
            Self::RegisterScript(path) => {
                debug!("Transcoding register script {}", path.display());
                Ok(register_script::transcode_file(path)?)
            }
        }
    }
}

#[derive(Debug)]
enum Payload {
    Source(CommandSource),
    Inline(Vec<u8>),
}

/// Summary of a finished camera configuration
#[derive(Debug, Clone, Serialize)]
pub struct CameraReport {
    pub info: CameraBasicInfo,
    pub directory_size: u32,
    pub total_size: u32,
    pub entries: Vec<DirectoryEntry>,
}

/// Builds one camera configuration container into a seekable writer
pub struct CameraConfigBuilder<W: Write + Seek> {
    writer: W,
    info: CameraBasicInfo,
    commands: Vec<(u32, Payload)>,
}

impl<W: Write + Seek> CameraConfigBuilder<W> {
    pub fn new(writer: W, info: CameraBasicInfo) -> Self {
        Self {
            writer,
            info,
            commands: Vec::new(),
        }
    }

    /// Number of commands queued so far
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    fn reserve(&self, identifier: u32) -> Result<(), CameraConfigError> {
        let taken = identifier == BASIC_CAMERA_CONFIG
            || self.commands.iter().any(|(id, _)| *id == identifier);
        if taken {
            return Err(DirectoryError::DuplicateIdentifier { identifier }.into());
        }
        Ok(())
    }

    /// Queue a command read from `source` when the container is written
    pub fn add_command(
        &mut self,
        id: &CommandId,
        source: CommandSource,
    ) -> Result<u32, CameraConfigError> {
        let identifier = id.resolve()?;
        self.reserve(identifier)?;
        if !source.path().is_file() {
            return Err(CameraConfigError::MissingInput {
                path: source.path().to_path_buf(),
            });
        }
        self.commands.push((identifier, Payload::Source(source)));
        Ok(identifier)
    }

    /// Queue a command with an in-memory payload
    pub fn add_command_bytes(
        &mut self,
        id: &CommandId,
        bytes: Vec<u8>,
    ) -> Result<u32, CameraConfigError> {
        let identifier = id.resolve()?;
        self.reserve(identifier)?;
        self.commands.push((identifier, Payload::Inline(bytes)));
        Ok(identifier)
    }

    /// Write payloads and directory, returning the writer
    pub fn finish(mut self) -> Result<(W, CameraReport), CameraConfigError> {
        let entry_count = 1 + self.commands.len();
        let directory_bytes = (entry_count * DIR_ENTRY_SIZE) as u64;
        let directory_size = u32::try_from(directory_bytes).map_err(|_| {
            CameraConfigError::OffsetOverflow {
                offset: directory_bytes,
            }
        })?;
        self.info.directory_entry_count = directory_size / DIR_ENTRY_FIELD;

        let mut table = DirectoryTable::new();
        let mut cursor = directory_bytes;

        let info_bytes = self.info.to_bytes();
        cursor = self.place(&mut table, BASIC_CAMERA_CONFIG, cursor, &info_bytes)?;

        for (identifier, payload) in std::mem::take(&mut self.commands) {
            let bytes = match payload {
                Payload::Source(source) => source.load()?,
                Payload::Inline(bytes) => bytes,
            };
            cursor = self.place(&mut table, identifier, cursor, &bytes)?;
        }

        self.writer
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.writer.write_all(&table.serialize()))
            .and_then(|()| self.writer.flush())
            .map_err(CameraConfigError::Write)?;

        let total_size =
            u32::try_from(cursor).map_err(|_| CameraConfigError::OffsetOverflow { offset: cursor })?;
        info!(
            "Camera configuration complete: {} entries, {} bytes",
            entry_count, total_size
        );

        let report = CameraReport {
            info: self.info,
            directory_size,
            total_size,
            entries: table.entries().to_vec(),
        };
        Ok((self.writer, report))
    }

    fn place(
        &mut self,
        table: &mut DirectoryTable,
        identifier: u32,
        offset: u64,
        bytes: &[u8],
    ) -> Result<u64, CameraConfigError> {
        let end = offset + bytes.len() as u64;
        let (Ok(start), Ok(size), Ok(_)) = (
            u32::try_from(offset),
            u32::try_from(bytes.len()),
            u32::try_from(end),
        ) else {
            return Err(CameraConfigError::OffsetOverflow { offset });
        };

        table.add_entry(identifier, start, size)?;
        self.writer
            .seek(SeekFrom::Start(offset))
            .and_then(|_| self.writer.write_all(bytes))
            .map_err(CameraConfigError::Write)?;
        debug!("Command {identifier:#06x} at {offset:#x} ({size} bytes)");
        Ok(end)
    }
}
