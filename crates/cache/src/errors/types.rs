//! Core error types for the cache system

use std::path::PathBuf;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Re-export CacheError as Error for convenience
pub use CacheError as Error;

/// Error type for cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The action has no usable entry.
    ///
    /// Covers a missing index, an unreadable or corrupt index, and an index
    /// whose content file is gone. These are deliberately not distinguished.
    #[error("no cache entry for action {action}")]
    NotFound { action: String },

    /// A caller-supplied identifier or path segment has the wrong shape
    #[error("malformed identifier '{input}': {reason}")]
    Malformed { input: String, reason: String },

    /// I/O errors during cache operations
    #[error("I/O error during {operation} on '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Invalid cache configuration, only reported at construction time
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// A remote cache answered with something other than the protocol allows
    #[error("remote cache error for '{endpoint}': {message}")]
    Remote { endpoint: String, message: String },
}

impl CacheError {
    /// Create a not-found error for an action
    #[must_use]
    pub fn not_found(action: impl ToString) -> Self {
        CacheError::NotFound {
            action: action.to_string(),
        }
    }

    /// Create a malformed-input error
    #[must_use]
    pub fn malformed(input: impl Into<String>, reason: impl Into<String>) -> Self {
        CacheError::Malformed {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error with path and operation context
    #[must_use]
    pub fn io(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        CacheError::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        CacheError::Configuration {
            message: message.into(),
        }
    }

    /// Create a remote protocol error
    #[must_use]
    pub fn remote(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Remote {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Whether this is an ordinary cache miss
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
