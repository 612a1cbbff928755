// src/filesystem/memory.rs

//! In-memory filesystem
//!
//! Paths are normalized (`.` components dropped, trailing slashes ignored)
//! and stored in a single ordered map, so directory listings come back
//! sorted. Parent directories must exist before a file is written, matching
//! the behavior of the host filesystem.

use super::FileSystem;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
enum Entry {
    Directory,
    File(String),
}

/// [`FileSystem`] that keeps everything in memory
#[derive(Debug)]
pub struct MemoryFileSystem {
    entries: RwLock<BTreeMap<PathBuf, Entry>>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    /// Create an empty tree containing only the root directory
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::Directory);
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Add a file, creating any missing parent directories
    pub fn with_file(self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        let path = normalize(path.as_ref());
        {
            let mut entries = self.entries.write();
            if let Some(parent) = path.parent() {
                mkdir_p(&mut entries, parent);
            }
            entries.insert(path, Entry::File(contents.into()));
        }
        self
    }

    /// Add an empty directory, creating any missing parents
    pub fn with_dir(self, path: impl AsRef<Path>) -> Self {
        let path = normalize(path.as_ref());
        mkdir_p(&mut self.entries.write(), &path);
        self
    }

    /// Number of files stored (directories excluded)
    pub fn file_count(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|e| matches!(e, Entry::File(_)))
            .count()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::ParentDir => {
                normalized.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    normalized
}

fn mkdir_p(entries: &mut BTreeMap<PathBuf, Entry>, path: &Path) {
    let mut current = PathBuf::from("/");
    for component in path.components() {
        if let Component::Normal(part) = component {
            current.push(part);
            entries.entry(current.clone()).or_insert(Entry::Directory);
        }
    }
}

fn not_found(path: &Path) -> Error {
    Error::path(path, io::Error::new(io::ErrorKind::NotFound, "no such file or directory"))
}

impl FileSystem for MemoryFileSystem {
    fn read_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let dir = normalize(dir);
        let entries = self.entries.read();

        match entries.get(&dir) {
            Some(Entry::Directory) => {}
            Some(Entry::File(_)) => {
                return Err(Error::path(
                    &dir,
                    io::Error::new(io::ErrorKind::Other, "not a directory"),
                ));
            }
            None => return Err(not_found(&dir)),
        }

        let names = entries
            .keys()
            .filter(|p| p.parent() == Some(dir.as_path()) && **p != dir)
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        Ok(names)
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let path = normalize(path);
        match self.entries.read().get(&path) {
            Some(Entry::File(contents)) => Ok(contents.clone()),
            Some(Entry::Directory) => Err(Error::path(
                &path,
                io::Error::new(io::ErrorKind::Other, "is a directory"),
            )),
            None => Err(not_found(&path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.read().contains_key(&normalize(path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let path = normalize(path);
        let mut entries = self.entries.write();

        let parent_is_dir = path
            .parent()
            .map(|p| matches!(entries.get(p), Some(Entry::Directory)))
            .unwrap_or(false);
        if !parent_is_dir {
            return Err(not_found(&path));
        }
        if matches!(entries.get(&path), Some(Entry::Directory)) {
            return Err(Error::path(
                &path,
                io::Error::new(io::ErrorKind::Other, "is a directory"),
            ));
        }

        entries.insert(path, Entry::File(contents.to_string()));
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let path = normalize(path);
        let mut entries = self.entries.write();

        let mut current = PathBuf::from("/");
        for component in path.components() {
            if let Component::Normal(part) = component {
                current.push(part);
                if let Some(Entry::File(_)) = entries.get(&current) {
                    return Err(Error::path(
                        &current,
                        io::Error::new(io::ErrorKind::AlreadyExists, "file exists"),
                    ));
                }
            }
        }
        mkdir_p(&mut entries, &path);
        Ok(())
    }
}
