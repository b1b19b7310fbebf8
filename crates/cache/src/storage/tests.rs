//! Store operation tests

use super::*;
use std::io::Cursor;
use std::time::Duration;
use tempfile::TempDir;

fn store() -> (TempDir, DiskStore) {
    let temp_dir = TempDir::new().unwrap();
    let store = DiskStore::open(temp_dir.path().join("cache")).unwrap();
    (temp_dir, store)
}

fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

#[test]
fn test_open_creates_all_shards() {
    let (_temp_dir, store) = store();
    for shard in 0..256 {
        assert!(shard_dir(store.root(), shard).is_dir());
    }
}

#[test]
fn test_put_get_file_round_trip() {
    let (_temp_dir, store) = store();
    let action = ActionId::new(b"echo hello");

    let (output, size) = store
        .put(&action, Cursor::new(b"hello\n"), at(1_700_000_000))
        .unwrap();
    assert_eq!(size, 6);
    assert_eq!(output, OutputId::of(b"hello\n"));

    let (path, entry) = store.get_file(&action).unwrap();
    assert_eq!(fs::read(&path).unwrap(), b"hello\n");
    assert_eq!(entry.output, output);
    assert_eq!(entry.size, 6);
    assert_eq!(entry.time, at(1_700_000_000));
}

#[test]
fn test_files_are_stamped_with_put_time() {
    let (_temp_dir, store) = store();
    let action = ActionId::new(b"stamp");

    let (output, _) = store
        .put(&action, Cursor::new(b"data"), at(1_650_000_000))
        .unwrap();

    let index_mtime = fs::metadata(index_path(store.root(), &action))
        .unwrap()
        .modified()
        .unwrap();
    let content_mtime = fs::metadata(content_path(store.root(), &output))
        .unwrap()
        .modified()
        .unwrap();
    assert_eq!(index_mtime, at(1_650_000_000));
    assert_eq!(content_mtime, at(1_650_000_000));
}

#[test]
fn test_overwrite_supersedes_previous_output() {
    let (_temp_dir, store) = store();
    let action = ActionId::new(b"date");

    store.put(&action, Cursor::new(b"monday"), at(1)).unwrap();
    store.put(&action, Cursor::new(b"tuesday"), at(2)).unwrap();

    let (data, entry) = store.get_bytes(&action).unwrap();
    assert_eq!(data, b"tuesday");
    assert_eq!(entry.output, OutputId::of(b"tuesday"));
}

#[test]
fn test_identical_outputs_share_content_file() {
    let (_temp_dir, store) = store();
    let first = ActionId::new(b"printf same");
    let second = ActionId::new(b"echo -n same");

    let (a, _) = store.put(&first, Cursor::new(b"same"), at(1)).unwrap();
    let (b, _) = store.put(&second, Cursor::new(b"same"), at(2)).unwrap();
    assert_eq!(a, b);

    let (path_a, _) = store.get_file(&first).unwrap();
    let (path_b, _) = store.get_file(&second).unwrap();
    assert_eq!(path_a, path_b);
}

#[test]
fn test_missing_index_is_not_found() {
    let (_temp_dir, store) = store();
    let action = ActionId::new(b"never written");

    assert!(store.get(&action).unwrap_err().is_not_found());
    assert!(store.get_file(&action).unwrap_err().is_not_found());
    assert!(store.get_bytes(&action).unwrap_err().is_not_found());
}

#[test]
fn test_dangling_index_is_not_found_and_left_alone() {
    let (_temp_dir, store) = store();
    let action = ActionId::new(b"evicted");

    let (output, _) = store.put(&action, Cursor::new(b"gone soon"), at(1)).unwrap();
    fs::remove_file(content_path(store.root(), &output)).unwrap();

    // Metadata lookups stay cheap and still succeed.
    assert!(store.get(&action).is_ok());
    assert!(store.get_file(&action).unwrap_err().is_not_found());
    assert!(index_path(store.root(), &action).exists());
}

#[test]
fn test_corrupt_index_is_not_found() {
    let (_temp_dir, store) = store();
    let action = ActionId::new(b"corrupt");

    store.put(&action, Cursor::new(b"fine"), at(1)).unwrap();
    fs::write(index_path(store.root(), &action), "garbage\n").unwrap();

    assert!(store.get(&action).unwrap_err().is_not_found());
}

#[test]
fn test_tampered_content_is_not_found() {
    let (_temp_dir, store) = store();
    let action = ActionId::new(b"tampered");

    let (output, _) = store.put(&action, Cursor::new(b"abcd"), at(1)).unwrap();
    fs::write(content_path(store.root(), &output), b"abce").unwrap();

    assert!(store.get_file(&action).is_ok());
    assert!(store.get_bytes(&action).unwrap_err().is_not_found());
}

#[test]
fn test_empty_output_is_storable() {
    let (_temp_dir, store) = store();
    let action = ActionId::new(b"true");

    let (output, size) = store.put(&action, io::empty(), at(1)).unwrap();
    assert_eq!(size, 0);
    assert_eq!(output, OutputId::of(b""));
    assert_eq!(store.get_bytes(&action).unwrap().0, Vec::<u8>::new());
}

#[test]
fn test_no_temporary_files_left_in_root() {
    let (_temp_dir, store) = store();
    store
        .put(&ActionId::new(b"tidy"), Cursor::new(b"x"), at(1))
        .unwrap();

    let leftovers: Vec<_> = fs::read_dir(store.root())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_concurrent_puts_for_different_actions() {
    let (_temp_dir, store) = store();
    let store = std::sync::Arc::new(store);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = std::sync::Arc::clone(&store);
            std::thread::spawn(move || {
                let action = ActionId::new(format!("job-{i}").as_bytes());
                let body = format!("output of job {i}");
                store
                    .put(&action, Cursor::new(body.clone().into_bytes()), at(1))
                    .unwrap();
                (action, body)
            })
        })
        .collect();

    for handle in handles {
        let (action, body) = handle.join().unwrap();
        assert_eq!(store.get_bytes(&action).unwrap().0, body.into_bytes());
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn put_then_get_bytes_returns_content(content in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let (_temp_dir, store) = store();
            let action = ActionId::new(&content);

            store.put(&action, Cursor::new(content.clone()), at(1)).unwrap();
            let (data, entry) = store.get_bytes(&action).unwrap();

            prop_assert_eq!(entry.size, content.len() as u64);
            prop_assert_eq!(data, content);
        }
    }
}
