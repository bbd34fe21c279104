//! Error types for gardimage
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Directory table errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Identifier already registered in this table
    #[error("Identifier {identifier:#06x} is passed multiple times")]
    DuplicateIdentifier { identifier: u32 },
}

/// Root image layout errors
#[derive(Error, Debug)]
pub enum LayoutError {
    /// Module identifier outside the range of its category
    #[error("Invalid {category} ID {identifier:#06x}. Valid range is {start:#06x} to {end:#06x}")]
    RangeViolation {
        category: &'static str,
        identifier: u32,
        start: u32,
        end: u32,
    },

    /// Alignment constraint not met
    #[error("Alignment violation: {message}")]
    AlignmentViolation { message: String },

    /// Module file does not exist
    #[error("{category} file '{path}' does not exist")]
    MissingInput {
        category: &'static str,
        path: PathBuf,
    },

    /// Directory copy count below one
    #[error("Number of directory copies {copies} is less than 1")]
    InvalidDirectoryCopies { copies: u32 },

    /// Serialized directory does not fit in one directory region
    #[error("Directory of {size} bytes does not fit in a {alignment:#x} byte region")]
    DirectoryOverflow { size: usize, alignment: u32 },

    /// Image grew past the 32-bit offset space
    #[error("Module at offset {offset:#x} exceeds the 32-bit flash address space")]
    OffsetOverflow { offset: u64 },

    /// Directory table error
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Module file could not be read
    #[error("Failed to read module '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Image could not be written
    #[error("Failed to write image: {0}")]
    Write(#[source] std::io::Error),
}

/// Camera configuration container errors
#[derive(Error, Debug)]
pub enum CameraConfigError {
    /// Command payload file does not exist
    #[error("Camera configuration command file '{path}' does not exist")]
    MissingInput { path: PathBuf },

    /// Symbolic command name not in the command table
    #[error("Unknown camera configuration command '{name}'")]
    UnknownCommand { name: String },

    /// Payload larger than the 32-bit size field
    #[error("Camera configuration grew past 4 GiB at offset {offset:#x}")]
    OffsetOverflow { offset: u64 },

    /// Directory table error
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Register script could not be transcoded
    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    /// Command payload could not be read
    #[error("Failed to read command payload '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Container could not be written
    #[error("Failed to write camera configuration: {0}")]
    Write(#[source] std::io::Error),
}

/// Register script transcoding errors
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// Row length does not fit the one-byte length field
    #[error("Register row on line {line} has {len} bytes (max 255)")]
    RowTooLong { line: usize, len: usize },

    /// Register script could not be read
    #[error("Failed to read register script '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Settings string and manifest errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Malformed `key=value` item
    #[error("Malformed setting '{item}': expected Key=Value")]
    MalformedSetting { item: String },

    /// Unknown settings key
    #[error("Unknown {section} key: {key}")]
    UnknownKey { section: &'static str, key: String },

    /// Value could not be parsed
    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },

    /// Manifest file could not be read
    #[error("Failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Manifest TOML could not be parsed
    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// Environment substitution failed
    #[error("Environment substitution failed: {0}")]
    Substitution(String),

    /// No output path in manifest or on the command line
    #[error("No output file given (set `output` in the manifest or pass --outfile)")]
    MissingOutput,
}

/// Image inspection errors
#[derive(Error, Debug)]
pub enum InspectError {
    /// Input shorter than a record requires
    #[error("Image truncated: need {needed} bytes at offset {offset:#x}, have {available}")]
    Truncated {
        offset: u64,
        needed: usize,
        available: usize,
    },

    /// Root image signature mismatch
    #[error("Invalid signature: expected {expected:#010x}, found {found:#010x}")]
    BadSignature { expected: u32, found: u32 },

    /// Directory does not describe whole entries
    #[error("Directory size {size} is not a multiple of {entry_size}")]
    RaggedDirectory { size: u32, entry_size: u32 },

    /// Directory entry points outside the file
    #[error("Entry {identifier:#06x} spans {offset:#x}+{size} past the end of the file ({len} bytes)")]
    EntryOutOfBounds {
        identifier: u32,
        offset: u64,
        size: u32,
        len: usize,
    },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to create the temporary output file
    #[error("Failed to create temporary file in '{path}': {error}")]
    CreateTemp { path: PathBuf, error: String },

    /// Failed to move the finished image into place
    #[error("Failed to write file '{path}': {error}")]
    Persist { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },
}

/// Top-level gardimage error type
#[derive(Error, Debug)]
pub enum GardImageError {
    /// Layout error
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Camera configuration error
    #[error("Camera configuration error: {0}")]
    Camera(#[from] CameraConfigError),

    /// Transcode error
    #[error("Register script error: {0}")]
    Transcode(#[from] TranscodeError),

    /// Manifest error
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Inspect error
    #[error("Inspect error: {0}")]
    Inspect(#[from] InspectError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),
}
