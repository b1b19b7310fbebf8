//! Core cache types and structures

use crate::clock::Clock;
use crate::config::CacheConfig;
use crate::storage::DiskStore;
use crate::trim::Trimmer;
use parking_lot::Mutex;
use std::sync::Arc;

/// A cache directory opened for use by this process
pub struct Cache {
    pub(super) store: DiskStore,
    /// Guards the trim schedule and orders all calls on this handle
    pub(super) trimmer: Mutex<Trimmer>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) config: CacheConfig,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("dir", &self.store.root())
            .field("config", &self.config)
            .finish()
    }
}
