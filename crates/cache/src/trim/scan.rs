//! Directory scan that deletes stale and oversized cache files

use super::TrimReport;
use crate::config::CacheConfig;
use crate::storage::paths::{is_cache_file, shard_dir, SHARD_COUNT};
use filecache_utils::TEMP_PREFIX;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::trace;

struct Survivor {
    modified: SystemTime,
    path: PathBuf,
    size: u64,
}

/// Walk every shard under `root` and delete the files the retention rules
/// reject, then enforce `max_size` if it is set.
///
/// Index and content files are judged independently by their own mtime and
/// size. Temporary files in the root left behind by interrupted writes are
/// removed once they are older than `trim_limit`. Failed deletions are
/// skipped.
pub fn trim_dir(root: &Path, config: &CacheConfig, now: SystemTime) -> TrimReport {
    let cutoff = now.checked_sub(config.trim_limit).unwrap_or(UNIX_EPOCH);
    let size_cutoff = now.checked_sub(config.trim_interval).unwrap_or(UNIX_EPOCH);

    let mut report = TrimReport::default();
    let mut survivors = Vec::new();

    sweep_temp_files(root, cutoff, &mut report);

    for shard in 0..SHARD_COUNT {
        for path in list_cache_files(&shard_dir(root, shard)) {
            let Ok(meta) = fs::metadata(&path) else {
                continue;
            };
            let Ok(modified) = meta.modified() else {
                continue;
            };
            let size = meta.len();
            report.scanned += 1;

            let expired = modified < cutoff;
            let oversized = config.trim_size > 0 && size > config.trim_size && modified < size_cutoff;

            if (expired || oversized) && remove(&path) {
                report.removed_files += 1;
                report.removed_bytes += size;
                continue;
            }

            report.retained_bytes += size;
            if config.max_size > 0 {
                survivors.push(Survivor {
                    modified,
                    path,
                    size,
                });
            }
        }
    }

    if config.max_size > 0 && report.retained_bytes > config.max_size {
        shrink(&mut report, survivors, config.max_size / 2);
    }

    report
}

/// Remove abandoned temporary files from the root. Files still being
/// written are far younger than `cutoff`.
fn sweep_temp_files(root: &Path, cutoff: SystemTime, report: &mut TrimReport) {
    let Ok(entries) = fs::read_dir(root) else {
        return;
    };

    let stale: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(TEMP_PREFIX))
        })
        .filter_map(|entry| {
            let meta = entry.metadata().ok()?;
            let modified = meta.modified().ok()?;
            (meta.is_file() && modified < cutoff).then(|| (entry.path(), meta.len()))
        })
        .collect();

    for (path, size) in stale {
        if remove(&path) {
            report.removed_files += 1;
            report.removed_bytes += size;
        }
    }
}

/// Delete the oldest survivors until at most `target` bytes remain
fn shrink(report: &mut TrimReport, mut survivors: Vec<Survivor>, target: u64) {
    survivors.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    for survivor in survivors {
        if report.retained_bytes <= target {
            break;
        }
        if remove(&survivor.path) {
            report.removed_files += 1;
            report.removed_bytes += survivor.size;
            report.retained_bytes -= survivor.size;
        }
    }
}

/// Names are collected before anything is removed so deletions cannot
/// disturb the directory iteration.
fn list_cache_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_str().is_some_and(is_cache_file))
        .map(|entry| entry.path())
        .collect()
}

/// Best-effort delete. A file that is already gone counts as removed.
fn remove(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            trace!(path = %path.display(), "trimmed cache file");
            true
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
        Err(e) => {
            trace!(path = %path.display(), error = %e, "could not trim cache file");
            false
        }
    }
}
