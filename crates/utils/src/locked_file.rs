//! Advisory-locked whole-file access
//!
//! A small file guarded by an OS-level lock is the only state that multiple
//! processes sharing a cache directory coordinate on. Locks are advisory: they
//! only exclude other processes that also go through this module.

use crate::errors::{Result, UtilsError};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// An open file holding an exclusive advisory lock until dropped
#[derive(Debug)]
pub struct LockedFile {
    file: File,
    path: PathBuf,
}

impl LockedFile {
    /// Open (creating if needed) and block until an exclusive lock is held
    pub fn open_exclusive(path: &Path) -> Result<Self> {
        let file = open_rw(path)?;
        file.lock_exclusive()
            .map_err(|e| UtilsError::file_system(path, "acquire exclusive lock", e))?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Try to acquire the exclusive lock without blocking.
    ///
    /// Returns `Ok(None)` when another process currently holds the lock.
    pub fn try_open_exclusive(path: &Path) -> Result<Option<Self>> {
        let file = open_rw(path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => Ok(None),
            Err(e) => Err(UtilsError::file_system(path, "acquire exclusive lock", e)),
        }
    }

    /// Path of the locked file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file from the start
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut contents = Vec::new();
        self.file
            .seek(SeekFrom::Start(0))
            .and_then(|_| self.file.read_to_end(&mut contents))
            .map_err(|e| UtilsError::file_system(&self.path, "read locked file", e))?;
        Ok(contents)
    }

    /// Replace the file contents in place while the lock is held
    pub fn replace(&mut self, contents: &[u8]) -> Result<()> {
        self.file
            .set_len(0)
            .and_then(|()| self.file.seek(SeekFrom::Start(0)))
            .and_then(|_| self.file.write_all(contents))
            .and_then(|()| self.file.sync_all())
            .map_err(|e| UtilsError::file_system(&self.path, "write locked file", e))
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Read a file under a shared lock. A missing file reads as `None`.
pub fn read_shared(path: &Path) -> Result<Option<Vec<u8>>> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(UtilsError::file_system(path, "open locked file", e)),
    };

    file.lock_shared()
        .map_err(|e| UtilsError::file_system(path, "acquire shared lock", e))?;

    let mut contents = Vec::new();
    let read = file.read_to_end(&mut contents);
    let _ = FileExt::unlock(&file);
    read.map_err(|e| UtilsError::file_system(path, "read locked file", e))?;

    Ok(Some(contents))
}

fn open_rw(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| UtilsError::file_system(path, "open lock file", e))
}
