//! Atomic file operations to prevent torn cache files
//!
//! Every write goes to a temporary file in the destination directory and is
//! renamed into place, so readers only ever observe a complete old file or a
//! complete new one.

use crate::errors::{Result, UtilsError};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;
use tempfile::NamedTempFile;

/// Create a named temporary file next to `path` so a later rename stays on
/// the same filesystem.
pub fn temp_file_beside(path: &Path) -> Result<NamedTempFile> {
    let parent = path.parent().ok_or_else(|| {
        UtilsError::file_system(
            path,
            "resolve parent directory",
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent"),
        )
    })?;

    fs::create_dir_all(parent)
        .map_err(|e| UtilsError::file_system(parent, "create parent directory", e))?;

    temp_file_in(parent)
}

/// Name prefix of every temporary file created here
pub const TEMP_PREFIX: &str = ".tmp-";

/// Create a named temporary file inside `dir`
pub fn temp_file_in(dir: &Path) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| UtilsError::file_system(dir, "create temporary file", e))
}

/// Rename a fully written temporary file over `path`.
///
/// When `mtime` is given it is stamped on the file before the rename. The
/// temporary file is removed if the rename fails.
pub fn persist_atomic(temp: NamedTempFile, path: &Path, mtime: Option<SystemTime>) -> Result<()> {
    if let Some(mtime) = mtime {
        temp.as_file()
            .set_modified(mtime)
            .map_err(|e| UtilsError::file_system(temp.path(), "set modification time", e))?;
    }

    temp.persist(path)
        .map_err(|e| UtilsError::file_system(path, "atomic rename", e.error))?;

    Ok(())
}

/// Write data to a file atomically by writing to a temporary file and renaming
pub fn write_atomic(path: &Path, content: &[u8], mtime: Option<SystemTime>) -> Result<()> {
    let mut temp = temp_file_beside(path)?;

    temp.write_all(content)
        .map_err(|e| UtilsError::file_system(temp.path(), "write to temporary file", e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| UtilsError::file_system(temp.path(), "sync temporary file", e))?;

    persist_atomic(temp, path, mtime)
}
