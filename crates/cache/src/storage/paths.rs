//! On-disk layout of the cache directory
//!
//! ```text
//! <root>/trim.txt
//! <root>/<2-hex-shard>/<action-hex>-a   index file
//! <root>/<2-hex-shard>/<output-hex>-d   content file
//! ```
//!
//! The shard is the first byte of the identifier the file is named after.
//! This layout is persistent state and must not change.

use crate::hashing::{ActionId, OutputId};
use std::path::{Path, PathBuf};

/// Suffix of index (action) files
pub const INDEX_SUFFIX: &str = "-a";

/// Suffix of content (output) files
pub const CONTENT_SUFFIX: &str = "-d";

/// Name of the file holding the last completed trim time
pub const TRIM_FILE: &str = "trim.txt";

/// Number of shard directories
pub const SHARD_COUNT: usize = 256;

/// Path of the index file for an action
pub fn index_path(root: &Path, action: &ActionId) -> PathBuf {
    root.join(action.shard())
        .join(format!("{}{INDEX_SUFFIX}", action.to_hex()))
}

/// Path of the content file for an output
pub fn content_path(root: &Path, output: &OutputId) -> PathBuf {
    root.join(output.shard())
        .join(format!("{}{CONTENT_SUFFIX}", output.to_hex()))
}

/// Path of shard directory `index` (0..256)
pub fn shard_dir(root: &Path, index: usize) -> PathBuf {
    root.join(format!("{index:02x}"))
}

/// Whether a directory entry name belongs to the cache (index or content)
pub fn is_cache_file(name: &str) -> bool {
    name.ends_with(INDEX_SUFFIX) || name.ends_with(CONTENT_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_are_sharded_by_first_byte() {
        let root = Path::new("/cache");
        let output = OutputId::of(b"hello");

        assert_eq!(
            content_path(root, &output),
            PathBuf::from(
                "/cache/2c/2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824-d"
            )
        );

        let action = ActionId::from_bytes([0xab; 32]);
        let index = index_path(root, &action);
        assert_eq!(index.parent(), Some(Path::new("/cache/ab")));
        assert!(index.to_string_lossy().ends_with("-a"));
    }

    #[test]
    fn test_shard_dir_names() {
        let root = Path::new("/cache");
        assert_eq!(shard_dir(root, 0), PathBuf::from("/cache/00"));
        assert_eq!(shard_dir(root, 255), PathBuf::from("/cache/ff"));
    }

    #[test]
    fn test_cache_file_filter() {
        assert!(is_cache_file("00ff-a"));
        assert!(is_cache_file("00ff-d"));
        assert!(!is_cache_file(".tmp-abc"));
        assert!(!is_cache_file("README"));
    }
}
