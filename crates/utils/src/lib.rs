//! Shared utilities for filecache
//!
//! Filesystem primitives the cache engine builds on (atomic replace, advisory
//! locked files), plus the small pieces of process glue shared by the binary.

pub mod atomic_file;
pub mod duration;
pub mod errors;
pub mod locked_file;
pub mod tracing;

pub use atomic_file::*;
pub use duration::parse_duration;
pub use errors::{Result, UtilsError};
pub use locked_file::{read_shared, LockedFile};
