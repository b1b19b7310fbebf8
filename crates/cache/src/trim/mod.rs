//! Eviction of stale, oversized and excess cache files
//!
//! Trims are throttled through `trim.txt` in the cache root, which records
//! when the last trim completed. The file is read and rewritten under an
//! exclusive advisory lock held for the whole trim, so processes sharing a
//! directory do not trim it redundantly. The in-memory copy of the timestamp
//! only ever short-circuits a trim; it never authorizes one.

mod scan;
pub mod state;

use crate::config::CacheConfig;
use crate::errors::Result;
use crate::storage::TRIM_FILE;
use filecache_utils::LockedFile;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};

pub use scan::trim_dir;
pub use state::{format_timestamp, parse_timestamp};

/// Outcome of one directory scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrimReport {
    /// Cache files examined
    pub scanned: u64,
    /// Files deleted, abandoned temporary files included
    pub removed_files: u64,
    /// Bytes freed
    pub removed_bytes: u64,
    /// Bytes left in cache files after the trim
    pub retained_bytes: u64,
}

/// Per-handle trim counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Directory scans actually performed
    pub trims: u64,
    pub last_report: Option<TrimReport>,
}

/// Trim scheduling state for one cache directory
#[derive(Debug)]
pub struct Trimmer {
    root: PathBuf,
    config: CacheConfig,
    last_trim: Option<SystemTime>,
    stats: CacheStats,
}

impl Trimmer {
    pub fn new(root: impl Into<PathBuf>, config: CacheConfig) -> Self {
        Self {
            root: root.into(),
            config,
            last_trim: None,
            stats: CacheStats::default(),
        }
    }

    /// Trim if the last trim is at least `trim_interval` old.
    ///
    /// Returns `Ok(None)` when the trim was skipped, either because one ran
    /// recently or because another process is trimming right now.
    pub fn maybe_trim(&mut self, now: SystemTime) -> Result<Option<TrimReport>> {
        if let Some(last) = self.last_trim {
            if state::is_recent(last, now, self.config.trim_interval) {
                return Ok(None);
            }
        }

        let Some(mut lock) = LockedFile::try_open_exclusive(&self.trim_file())? else {
            debug!(root = %self.root.display(), "trim already in progress elsewhere");
            return Ok(None);
        };

        // An unreadable timestamp counts as no timestamp, so the trim runs.
        let stored = match lock.read_all() {
            Ok(contents) => parse_timestamp(&contents),
            Err(e) => {
                debug!(path = %lock.path().display(), error = %e, "unreadable trim time");
                None
            }
        };
        if let Some(last) = stored {
            if state::is_recent(last, now, self.config.trim_interval) {
                self.last_trim = Some(last);
                return Ok(None);
            }
        }

        Ok(Some(self.run(&mut lock, now)))
    }

    /// Trim regardless of when the last trim happened, waiting for any
    /// other process that is trimming the same directory.
    pub fn force_trim(&mut self, now: SystemTime) -> Result<TrimReport> {
        let mut lock = LockedFile::open_exclusive(&self.trim_file())?;
        Ok(self.run(&mut lock, now))
    }

    /// When this handle last saw a trim complete
    pub fn last_trim(&self) -> Option<SystemTime> {
        self.last_trim
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    fn trim_file(&self) -> PathBuf {
        trim_file(&self.root)
    }

    fn run(&mut self, lock: &mut LockedFile, now: SystemTime) -> TrimReport {
        let report = trim_dir(&self.root, &self.config, now);

        self.last_trim = Some(now);
        self.stats.trims += 1;
        self.stats.last_report = Some(report.clone());

        // A stale timestamp only makes the next trim come early.
        if let Err(e) = lock.replace(format_timestamp(now).as_bytes()) {
            warn!(path = %lock.path().display(), error = %e, "failed to record trim time");
        }

        info!(
            root = %self.root.display(),
            scanned = report.scanned,
            removed = report.removed_files,
            bytes = report.removed_bytes,
            retained = report.retained_bytes,
            "trimmed cache"
        );
        report
    }
}

/// Path of the trim timestamp file under `root`
pub fn trim_file(root: &Path) -> PathBuf {
    root.join(TRIM_FILE)
}
