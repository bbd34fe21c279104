//! gardimage - GARD SoM flash image builder
//!
//! This library assembles the flash images a GARD system-on-module boots
//! from: a root image of aligned modules behind a replicated directory, the
//! camera configuration container stored in one of those modules, and the
//! binary command blobs transcoded from register scripts.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Image layout and encoding (writes only to `Write + Seek`)
//! - [`infra`] - Infrastructure layer (atomic output files)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
