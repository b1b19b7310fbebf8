//! Error handling for the cache engine
//!
//! Callers see three outcomes that matter: the entry is not usable
//! (`NotFound`), their input had the wrong shape (`Malformed`), or the
//! filesystem failed (`Io`). Nothing is retried internally.

mod conversions;
mod types;

pub use types::*;
