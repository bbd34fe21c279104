//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Size of one directory entry
pub const ENTRY: usize = 12;

/// Test project context
///
/// Creates a temporary directory holding module files and build outputs.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Absolute path of `name` inside the project
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Create a text file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        self.create_binary(name, content.as_bytes());
    }

    /// Create a binary file in the test project
    pub fn create_binary(&self, name: &str, content: &[u8]) {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.join(name).exists()
    }

    /// Read a binary file from the test project
    pub fn read_binary(&self, name: &str) -> Vec<u8> {
        std::fs::read(self.join(name)).expect("Failed to read file")
    }

    /// Number of entries in the project directory
    pub fn entry_count(&self) -> usize {
        std::fs::read_dir(self.dir.path())
            .expect("Failed to list directory")
            .count()
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Run gardimage inside the project directory
pub fn run_gardimage(project: &TestProject, args: &[&str]) -> Output {
    run_in(project.dir.path(), args)
}

/// Run gardimage in `dir`
pub fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gardimage"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute gardimage")
}

/// Read a little-endian u32 at `offset`
pub fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(bytes[offset..offset + 4].try_into().expect("4 bytes"))
}

/// Decode `count` directory entries starting at `offset`
pub fn entries_at(bytes: &[u8], offset: usize, count: usize) -> Vec<(u32, u32, u32)> {
    (0..count)
        .map(|i| {
            let base = offset + i * ENTRY;
            (u32_at(bytes, base), u32_at(bytes, base + 4), u32_at(bytes, base + 8))
        })
        .collect()
}

/// Sample root manifest with one firmware and one ML module
pub const SAMPLE_ROOT_MANIFEST: &str = r#"
output = "out/root.bin"

[layout]
alignment = 0x1000
directory_copies = 2

[[module]]
category = "ml"
id = 0x2001
path = "ml.bin"

[[module]]
category = "firmware"
id = 0x1001
path = "fw.bin"
"#;

/// Sample camera manifest with a register script and a binary command
pub const SAMPLE_CAMERA_MANIFEST: &str = r#"
output = "camera.bin"

[basic]
vendor_name = "Sony"
model_name = "IMX-219"
driver_version = "3.23.04"
interfaces = ["mipi", "i2c"]

[[command]]
id = "START_STREAM"
path = "start.txt"

[[command]]
id = 0x1012
path = "stop.bin"
"#;

/// Register script exercising both record kinds
pub const SAMPLE_SCRIPT: &str = "\
// sensor init
0x10, 0xAA, 0xBB
0x20, 0xCC, 0xDD,
0x85, 0x01, 0x02   // delay
0x00, 0x99
";
