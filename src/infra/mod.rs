//! Infrastructure layer
//!
//! Handles filesystem side effects. Builders in [`crate::core`] only see a
//! `Write + Seek` handle.

pub mod filesystem;
