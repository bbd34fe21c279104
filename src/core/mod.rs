//! Core image building logic
//!
//! Builders write into any `Write + Seek`; opening and persisting files
//! belongs in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`codec`] - Fixed-width little-endian records
//! - [`directory`] - Directory table shared by both containers
//! - [`module_id`] - Root image module identifier ranges
//! - [`register_script`] - Register script to binary transcoder
//! - [`camera`] - Camera configuration container
//! - [`layout`] - Root image layout engine
//! - [`settings`] - `Key=Value` settings strings
//! - [`manifest`] - Build manifest (gardimage.toml) parsing
//! - [`inspect`] - Decoding of built images

pub mod camera;
pub mod codec;
pub mod directory;
pub mod inspect;
pub mod layout;
pub mod manifest;
pub mod module_id;
pub mod register_script;
pub mod settings;
