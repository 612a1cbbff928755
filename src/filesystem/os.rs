// src/filesystem/os.rs

//! Pass-through to the host filesystem

use super::FileSystem;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl OsFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for OsFileSystem {
    fn read_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let entries = fs::read_dir(dir).map_err(|e| Error::path(dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::path(dir, e))?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::path(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        fs::write(path, contents).map_err(|e| Error::path(path, e))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| Error::path(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let fs = OsFileSystem::new();
        let path = temp.path().join("nested/config.toml");

        fs.create_dir_all(path.parent().unwrap()).unwrap();
        fs.write(&path, "use_sudo = false\n").unwrap();

        assert!(fs.exists(&path));
        assert_eq!(fs.read_to_string(&path).unwrap(), "use_sudo = false\n");
        assert_eq!(fs.read_dir(&temp.path().join("nested")).unwrap(), vec!["config.toml"]);
    }

    #[test]
    fn test_missing_file_error_names_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.sql");

        let err = OsFileSystem::new().read_to_string(&path).unwrap_err();
        assert!(err.to_string().contains("absent.sql"));
    }
}
