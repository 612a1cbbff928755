// src/filesystem/mod.rs

//! Filesystem abstraction for devboot
//!
//! Everything that touches configuration files or migration scripts goes
//! through the [`FileSystem`] trait so callers can swap the real OS for an
//! in-memory tree. There is no process-wide instance; each component receives
//! the filesystem it should use.

mod memory;
mod os;

pub use memory::MemoryFileSystem;
pub use os::OsFileSystem;

use crate::error::Result;
use std::path::Path;

/// Minimal set of file operations used by config loading and migrations
pub trait FileSystem {
    /// List the names of entries directly inside `dir`
    fn read_dir(&self, dir: &Path) -> Result<Vec<String>>;

    /// Read a whole file as UTF-8
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Check whether a file or directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Create or truncate a file with the given contents
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Create a directory and all missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}
