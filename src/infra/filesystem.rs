//! Filesystem operations
//!
//! Images are written to a temporary file beside the target and moved into
//! place only once the build has succeeded.

use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read a whole file
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, FilesystemError> {
    std::fs::read(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Directory a temporary file for `target` must live in to be renamed over it
fn target_dir(target: &Path) -> PathBuf {
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Mode a new output file is created with
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Permissions the staged file takes: those of an existing `target`, else
/// [`OUTPUT_MODE`]
#[cfg(unix)]
fn output_permissions(target: &Path) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(target).map_or_else(
        |_| std::fs::Permissions::from_mode(OUTPUT_MODE),
        |meta| meta.permissions(),
    )
}

/// Create a temporary file next to `target`.
///
/// Dropping the returned file without [`persist`] deletes it, leaving any
/// existing `target` untouched.
pub fn create_output(target: &Path) -> Result<NamedTempFile, FilesystemError> {
    let dir = target_dir(target);
    create_dir_all(&dir)?;
    let temp = NamedTempFile::new_in(&dir).map_err(|e| FilesystemError::CreateTemp {
        path: dir.clone(),
        error: e.to_string(),
    })?;
    #[cfg(unix)]
    temp.as_file()
        .set_permissions(output_permissions(target))
        .map_err(|e| FilesystemError::CreateTemp {
            path: temp.path().to_path_buf(),
            error: e.to_string(),
        })?;
    debug!("Staging {} in {}", target.display(), temp.path().display());
    Ok(temp)
}

/// Move a finished temporary file over `target`
pub fn persist(temp: NamedTempFile, target: &Path) -> Result<(), FilesystemError> {
    temp.persist(target).map_err(|e| FilesystemError::Persist {
        path: target.to_path_buf(),
        error: e.error.to_string(),
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_persist_replaces_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("image.bin");
        std::fs::write(&target, b"old").unwrap();

        let mut temp = create_output(&target).unwrap();
        temp.write_all(b"new").unwrap();
        persist(temp, &target).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"new");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_new_output_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("image.bin");
        let temp = create_output(&target).unwrap();
        persist(temp, &target).unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn test_persist_keeps_existing_target_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let target = dir.path().join("image.bin");
        std::fs::write(&target, b"old").unwrap();
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o640)).unwrap();

        let mut temp = create_output(&target).unwrap();
        temp.write_all(b"new").unwrap();
        persist(temp, &target).unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[test]
    fn test_dropped_output_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("image.bin");
        std::fs::write(&target, b"old").unwrap();

        let mut temp = create_output(&target).unwrap();
        temp.write_all(b"partial").unwrap();
        drop(temp);

        assert_eq!(std::fs::read(&target).unwrap(), b"old");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_create_output_makes_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out/nested/image.bin");
        let temp = create_output(&target).unwrap();
        persist(temp, &target).unwrap();
        assert!(target.is_file());
    }

    #[test]
    fn test_target_dir_of_bare_file_name() {
        assert_eq!(target_dir(Path::new("image.bin")), PathBuf::from("."));
        assert_eq!(target_dir(Path::new("out/image.bin")), PathBuf::from("out"));
    }

    #[test]
    fn test_read_bytes_missing() {
        let err = read_bytes(Path::new("/nonexistent/gardimage")).unwrap_err();
        assert!(matches!(err, FilesystemError::ReadFile { .. }));
    }
}
