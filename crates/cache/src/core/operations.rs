//! Cache operations

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::errors::{CacheError, Result};
use crate::hashing::{ActionId, OutputId};
use crate::trim::{parse_timestamp, trim_file, CacheStats, TrimReport};
use filecache_utils::read_shared;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

use super::types::Cache;

impl Cache {
    /// Store `content` as the output of `action`, trimming first if a trim
    /// is due. A failed trim is logged and does not fail the put.
    pub fn put<R: Read>(&self, action: &ActionId, content: R) -> Result<(OutputId, u64)> {
        let mut trimmer = self.trimmer.lock();
        let now = self.clock.now();

        if let Err(e) = trimmer.maybe_trim(now) {
            warn!(dir = %self.dir().display(), error = %e, "cache trim failed");
        }

        self.store.put(action, content, now)
    }

    /// Look up the index entry of `action`
    pub fn get(&self, action: &ActionId) -> Result<Entry> {
        let _guard = self.trimmer.lock();
        self.store.get(action)
    }

    /// Look up `action` and resolve the path of its content file
    pub fn get_file(&self, action: &ActionId) -> Result<(PathBuf, Entry)> {
        let _guard = self.trimmer.lock();
        self.store.get_file(action)
    }

    /// Look up `action` and read its whole output into memory
    pub fn get_bytes(&self, action: &ActionId) -> Result<(Vec<u8>, Entry)> {
        let _guard = self.trimmer.lock();
        self.store.get_bytes(action)
    }

    /// Trim now, regardless of the trim interval
    pub fn trim(&self) -> Result<TrimReport> {
        let mut trimmer = self.trimmer.lock();
        trimmer.force_trim(self.clock.now())
    }

    /// Trim counters of this handle
    pub fn stats(&self) -> CacheStats {
        self.trimmer.lock().stats()
    }

    /// Completion time of the last trim by any process, from `trim.txt`
    pub fn last_trim(&self) -> Result<Option<SystemTime>> {
        let path = trim_file(self.dir());
        let contents = read_shared(&path).map_err(CacheError::from)?;
        Ok(contents.as_deref().and_then(parse_timestamp))
    }

    /// Root directory of the cache
    pub fn dir(&self) -> &Path {
        self.store.root()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current time according to this handle's clock
    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }
}
