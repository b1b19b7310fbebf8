//! Sharded on-disk store mapping actions to outputs
//!
//! Every mutation is "write a temporary file in the same filesystem, then
//! rename it into place", so concurrent processes can never observe a torn
//! file. Two writers racing on the same action both succeed and the last
//! rename wins.

pub mod paths;

use crate::entry::Entry;
use crate::errors::{CacheError, Result};
use crate::hashing::{ActionId, HashingWriter, OutputId};
use filecache_utils::{persist_atomic, temp_file_in, write_atomic};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};

pub use paths::{content_path, index_path, shard_dir, CONTENT_SUFFIX, INDEX_SUFFIX, TRIM_FILE};

/// The key/value engine over one cache directory
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    /// Open a cache directory, creating the root and all shard directories
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| CacheError::io(&root, "create cache directory", e))?;

        for shard in 0..paths::SHARD_COUNT {
            let dir = shard_dir(&root, shard);
            fs::create_dir_all(&dir)
                .map_err(|e| CacheError::io(&dir, "create shard directory", e))?;
        }

        Ok(Self { root })
    }

    /// Root directory of the cache
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store the bytes of `content` as the output of `action`.
    ///
    /// The content is hashed while it is spooled to a temporary file, so it
    /// is read exactly once and never buffered in memory. Both files written
    /// get `now` as their modification time.
    pub fn put<R: Read>(
        &self,
        action: &ActionId,
        mut content: R,
        now: SystemTime,
    ) -> Result<(OutputId, u64)> {
        let temp = temp_file_in(&self.root)?;
        let temp_path = temp.path().to_path_buf();

        let mut writer = HashingWriter::new(temp);
        io::copy(&mut content, &mut writer)
            .map_err(|e| CacheError::io(&temp_path, "spool cache output", e))?;
        writer
            .flush()
            .map_err(|e| CacheError::io(&temp_path, "flush cache output", e))?;
        let (temp, output, size): (_, OutputId, u64) = writer.finish();

        temp.as_file()
            .sync_all()
            .map_err(|e| CacheError::io(&temp_path, "sync cache output", e))?;

        let data_path = content_path(&self.root, &output);
        persist_atomic(temp, &data_path, Some(now))?;

        // Content first: a visible index must never point at content that was
        // not yet renamed into place.
        let entry = Entry {
            output,
            size,
            time: now,
        };
        write_atomic(
            &index_path(&self.root, action),
            entry.encode(action).as_bytes(),
            Some(now),
        )?;

        debug!(action = %action, output = %output, size, "stored cache entry");
        Ok((output, size))
    }

    /// Read the index entry for `action` without touching its content
    pub fn get(&self, action: &ActionId) -> Result<Entry> {
        let path = index_path(&self.root, action);
        let line = match fs::read_to_string(&path) {
            Ok(line) => line,
            Err(e) if is_missing(&e) => {
                trace!(action = %action, "cache miss");
                return Err(CacheError::not_found(action));
            }
            Err(e) => return Err(CacheError::io(&path, "read index file", e)),
        };

        Entry::decode(action, &line).ok_or_else(|| {
            debug!(action = %action, path = %path.display(), "ignoring unreadable index file");
            CacheError::not_found(action)
        })
    }

    /// Resolve the content file of `action`.
    ///
    /// A missing content file or one whose size disagrees with the index is
    /// reported as `NotFound`, exactly like a missing index. The dangling
    /// index is left for the trimmer.
    pub fn get_file(&self, action: &ActionId) -> Result<(PathBuf, Entry)> {
        let entry = self.get(action)?;
        let path = content_path(&self.root, &entry.output);

        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() == entry.size => Ok((path, entry)),
            Ok(meta) => {
                debug!(
                    action = %action,
                    expected = entry.size,
                    actual = meta.len(),
                    "content file does not match index"
                );
                Err(CacheError::not_found(action))
            }
            Err(e) => {
                debug!(action = %action, error = %e, "content file unavailable");
                Err(CacheError::not_found(action))
            }
        }
    }

    /// Load the whole output of `action` into memory.
    ///
    /// Intended for small outputs only. Content whose hash no longer matches
    /// its name is reported as `NotFound`.
    pub fn get_bytes(&self, action: &ActionId) -> Result<(Vec<u8>, Entry)> {
        let (path, entry) = self.get_file(action)?;

        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if is_missing(&e) => return Err(CacheError::not_found(action)),
            Err(e) => return Err(CacheError::io(&path, "read content file", e)),
        };

        if OutputId::of(&data) != entry.output {
            debug!(action = %action, path = %path.display(), "content hash mismatch");
            return Err(CacheError::not_found(action));
        }

        Ok((data, entry))
    }
}

fn is_missing(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::NotFound
}

#[cfg(test)]
mod tests;
