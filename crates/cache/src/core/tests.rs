//! Facade tests

use super::*;
use crate::clock::{Clock, ManualClock};
use crate::config::CacheConfig;
use crate::hashing::ActionId;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        UNIX_EPOCH + Duration::from_secs(1_700_000_000),
    ))
}

#[test]
fn test_open_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("nested").join("cache");

    let cache = Cache::open(&dir, CacheConfig::default()).unwrap();

    assert_eq!(cache.dir(), dir);
    assert!(dir.join("00").is_dir());
    assert!(dir.join("ff").is_dir());
}

#[test]
fn test_open_rejects_invalid_config() {
    let temp_dir = TempDir::new().unwrap();
    let result = Cache::builder(temp_dir.path())
        .with_trim_size(4096)
        .with_max_size(1024)
        .open();

    assert!(matches!(
        result,
        Err(crate::errors::CacheError::Configuration { .. })
    ));
}

#[test]
fn test_open_fails_when_path_is_a_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("occupied");
    std::fs::write(&file, "x").unwrap();

    let result = Cache::open(&file, CacheConfig::default());
    assert!(matches!(result, Err(crate::errors::CacheError::Io { .. })));
}

#[test]
fn test_put_and_lookups() {
    let temp_dir = TempDir::new().unwrap();
    let clock = clock();
    let cache = Cache::builder(temp_dir.path())
        .with_clock(clock.clone())
        .open()
        .unwrap();
    let action = ActionId::new(b"go version");

    let (output, size) = cache.put(&action, Cursor::new(b"go1.22")).unwrap();
    assert_eq!(size, 6);

    let entry = cache.get(&action).unwrap();
    assert_eq!(entry.output, output);
    assert_eq!(entry.time, clock.now());

    let (path, _) = cache.get_file(&action).unwrap();
    assert!(path.starts_with(temp_dir.path()));
    assert_eq!(cache.get_bytes(&action).unwrap().0, b"go1.22");
}

#[test]
fn test_first_put_trims_and_records_time() {
    let temp_dir = TempDir::new().unwrap();
    let clock = clock();
    let cache = Cache::builder(temp_dir.path())
        .with_clock(clock.clone())
        .open()
        .unwrap();

    assert_eq!(cache.last_trim().unwrap(), None);
    cache
        .put(&ActionId::new(b"first"), Cursor::new(b"1"))
        .unwrap();

    assert_eq!(cache.stats().trims, 1);
    assert_eq!(cache.last_trim().unwrap(), Some(clock.now()));
}

#[test]
fn test_non_utf8_trim_file_does_not_block_trims() {
    let temp_dir = TempDir::new().unwrap();
    let clock = clock();
    let cache = Cache::builder(temp_dir.path())
        .with_clock(clock.clone())
        .open()
        .unwrap();
    std::fs::write(temp_dir.path().join("trim.txt"), [0xff, 0xfe]).unwrap();

    assert_eq!(cache.last_trim().unwrap(), None);
    cache
        .put(&ActionId::new(b"after garbage"), Cursor::new(b"1"))
        .unwrap();

    assert_eq!(cache.stats().trims, 1);
    assert_eq!(cache.last_trim().unwrap(), Some(clock.now()));
}

#[test]
fn test_gets_never_trim() {
    let temp_dir = TempDir::new().unwrap();
    let cache = Cache::builder(temp_dir.path())
        .with_clock(clock())
        .open()
        .unwrap();
    let action = ActionId::new(b"read only");

    let _ = cache.get(&action);
    let _ = cache.get_file(&action);
    let _ = cache.get_bytes(&action);

    assert_eq!(cache.stats().trims, 0);
}

#[test]
fn test_forced_trim_counts() {
    let temp_dir = TempDir::new().unwrap();
    let cache = Cache::builder(temp_dir.path())
        .with_clock(clock())
        .open()
        .unwrap();

    let report = cache.trim().unwrap();
    cache.trim().unwrap();

    assert_eq!(report.scanned, 0);
    assert_eq!(cache.stats().trims, 2);
}

#[test]
fn test_handle_is_shareable_across_threads() {
    let temp_dir = TempDir::new().unwrap();
    let cache = Arc::new(Cache::open(temp_dir.path(), CacheConfig::default()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let cache = Arc::clone(&cache);
            std::thread::spawn(move || {
                let action = ActionId::new(format!("thread {i}").as_bytes());
                cache.put(&action, Cursor::new(vec![i as u8; 64])).unwrap();
                action
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let action = handle.join().unwrap();
        assert_eq!(cache.get_bytes(&action).unwrap().0, vec![i as u8; 64]);
    }
    assert_eq!(cache.stats().trims, 1);
}

#[test]
fn test_now_follows_clock() {
    let temp_dir = TempDir::new().unwrap();
    let clock = clock();
    let cache = Cache::builder(temp_dir.path())
        .with_clock(clock.clone())
        .open()
        .unwrap();

    let before: SystemTime = cache.now();
    clock.advance(Duration::from_secs(5));
    assert_eq!(cache.now(), before + Duration::from_secs(5));
}
