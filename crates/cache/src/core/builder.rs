//! Cache builder and initialization

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::errors::Result;
use crate::storage::DiskStore;
use crate::trim::Trimmer;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::Cache;

/// Named options for opening a [`Cache`]
#[must_use]
pub struct CacheBuilder {
    dir: PathBuf,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl CacheBuilder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            config: CacheConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace every eviction setting at once
    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_trim_interval(mut self, interval: Duration) -> Self {
        self.config.trim_interval = interval;
        self
    }

    pub fn with_trim_limit(mut self, limit: Duration) -> Self {
        self.config.trim_limit = limit;
        self
    }

    pub fn with_trim_size(mut self, bytes: u64) -> Self {
        self.config.trim_size = bytes;
        self
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.config.max_size = bytes;
        self
    }

    /// Use `clock` for timestamps and trim decisions instead of wall time
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the options and open the directory, creating it if absent
    pub fn open(self) -> Result<Cache> {
        self.config.validate()?;

        let store = DiskStore::open(self.dir)?;
        let trimmer = Trimmer::new(store.root(), self.config.clone());
        debug!(dir = %store.root().display(), config = ?self.config, "opened cache");

        Ok(Cache {
            store,
            trimmer: Mutex::new(trimmer),
            clock: self.clock,
            config: self.config,
        })
    }
}

impl Cache {
    /// Open `dir` with `config` and the system clock
    pub fn open(dir: impl Into<PathBuf>, config: CacheConfig) -> Result<Self> {
        CacheBuilder::new(dir).with_config(config).open()
    }

    pub fn builder(dir: impl Into<PathBuf>) -> CacheBuilder {
        CacheBuilder::new(dir)
    }
}
