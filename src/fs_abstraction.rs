//! Filesystem abstraction layer for testability
//!
//! The document root, the PAM load fragment and the nginx.conf backup/write
//! all go through [`FileSystem`]. Uses mockall for automatic mock generation
//! in test builds.

use std::fs::Permissions;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::NamedTempFile;

#[cfg(test)]
use mockall::automock;

/// Mode given to files written with [`FileSystem::write_atomic`].
const CONFIG_FILE_MODE: u32 = 0o644;

/// Trait abstracting filesystem operations for dependency injection.
///
/// # Example (testing)
/// ```ignore
/// use nginx_setup::fs_abstraction::MockFileSystem;
/// use std::path::Path;
///
/// let mut mock_fs = MockFileSystem::new();
/// mock_fs.expect_exists()
///     .returning(|p| p == Path::new("/etc/nginx/nginx.conf"));
/// ```
#[cfg_attr(test, automock)]
pub trait FileSystem: Send + Sync {
    /// Write bytes to a file, creating or truncating it.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Replace a file through a temporary sibling and a rename, so readers
    /// see either the old or the new content. The parent must exist.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy a file, overwriting the destination.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;
}

/// Real filesystem implementation using std::fs.
#[derive(Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        std::fs::write(path, contents)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        // Temp file in the same directory so the rename stays on one filesystem
        let mut temp_file = NamedTempFile::new_in(parent)?;
        temp_file.write_all(contents)?;
        temp_file
            .as_file()
            .set_permissions(Permissions::from_mode(CONFIG_FILE_MODE))?;
        temp_file.as_file().sync_all()?;

        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }
}

/// Global filesystem instance for production use.
static REAL_FS: RealFileSystem = RealFileSystem;

/// Get a reference to the global real filesystem instance.
///
/// For testing, create a `MockFileSystem` or point a `RealFileSystem` at a
/// temporary directory instead.
pub fn real_fs() -> &'static RealFileSystem {
    &REAL_FS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_read_write() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("index.html");

        let fs = RealFileSystem;
        fs.write(&file_path, b"<h1>localhost</h1>").unwrap();

        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "<h1>localhost</h1>");
    }

    #[test]
    fn test_real_fs_exists() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nginx.conf");

        let fs = RealFileSystem;
        assert!(!fs.exists(&file_path));
        fs.write(&file_path, b"events {}").unwrap();
        assert!(fs.exists(&file_path));
    }

    #[test]
    fn test_real_fs_create_dir_all() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("var/www/example.com");

        let fs = RealFileSystem;
        fs.create_dir_all(&nested_path).unwrap();
        assert!(nested_path.is_dir());

        // Existing directories are fine
        fs.create_dir_all(&nested_path).unwrap();
    }

    #[test]
    fn test_real_fs_copy_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("nginx.conf");
        let dst = temp_dir.path().join("nginx.conf.bak");

        let fs = RealFileSystem;
        fs.write(&src, b"new").unwrap();
        fs.write(&dst, b"older backup").unwrap();

        assert_eq!(fs.copy(&src, &dst).unwrap(), 3);
        assert_eq!(std::fs::read_to_string(&dst).unwrap(), "new");
    }

    #[test]
    fn test_real_fs_write_atomic_replaces() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nginx.conf");

        let fs = RealFileSystem;
        fs.write(&file_path, b"old content that is longer").unwrap();
        fs.write_atomic(&file_path, b"new").unwrap();

        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "new");

        // Only the target is left behind, no temp files
        let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_real_fs_write_atomic_mode() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("nginx.conf");

        RealFileSystem.write_atomic(&file_path, b"x").unwrap();

        let mode = std::fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, CONFIG_FILE_MODE);
    }

    #[test]
    fn test_real_fs_write_atomic_missing_parent() {
        let result = RealFileSystem.write_atomic(Path::new("/nonexistent/dir/nginx.conf"), b"x");
        assert!(result.is_err());
    }

    #[test]
    fn test_real_fs_copy_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let result = RealFileSystem.copy(
            Path::new("/nonexistent/nginx.conf"),
            &temp_dir.path().join("dst"),
        );
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_static_instance() {
        assert!(!real_fs().exists(Path::new("/nonexistent/path")));
    }

    #[test]
    fn test_real_fs_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RealFileSystem>();
    }

    #[test]
    fn test_mock_fs_error_simulation() {
        let mut mock = MockFileSystem::new();
        mock.expect_write_atomic().returning(|_, _| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        });

        let result = mock.write_atomic(Path::new("/etc/nginx/nginx.conf"), b"x");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }
}
