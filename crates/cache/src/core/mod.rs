//! The synchronized cache handle
//!
//! [`Cache`] serializes every store and trim call made through one handle
//! behind a single mutex. Cross-process safety comes from the filesystem
//! layer underneath; the mutex only keeps one process from interleaving its
//! own trims and writes.

mod builder;
mod operations;
mod types;

pub use builder::CacheBuilder;
pub use types::Cache;

#[cfg(test)]
mod tests;
