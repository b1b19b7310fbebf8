//! Persistent content-addressed cache for the outputs of repeatable
//! computations.
//!
//! A cache directory maps an [`ActionId`] (the hash of a computation's
//! description) to an [`OutputId`] (the hash of what it produced) plus the
//! produced bytes. Entries are evicted by age, by size and by an optional
//! ceiling on total bytes. Many processes may share one directory; the cache
//! can also be shared between machines through the HTTP protocol in
//! [`remote`].
//!
//! ```no_run
//! use filecache::{ActionId, Cache, CacheConfig};
//!
//! # fn main() -> filecache::Result<()> {
//! let cache = Cache::open("/tmp/filecache", CacheConfig::default())?;
//! let action = ActionId::from_command(&["go", "version"], None);
//! match cache.get_bytes(&action) {
//!     Ok((bytes, _)) => println!("{}", String::from_utf8_lossy(&bytes)),
//!     Err(e) if e.is_not_found() => {
//!         cache.put(&action, &b"go version go1.22.0 linux/amd64\n"[..])?;
//!     }
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod core;
pub mod entry;
pub mod errors;
pub mod hashing;
pub mod remote;
pub mod storage;
pub mod trim;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{default_cache_dir, CacheConfig};
pub use crate::core::{Cache, CacheBuilder};
pub use entry::Entry;
pub use errors::{CacheError, Error, Result};
pub use hashing::{ActionId, Hasher, HashingWriter, OutputId, ID_SIZE};
pub use remote::RemoteClient;
pub use storage::DiskStore;
pub use trim::{CacheStats, TrimReport};
