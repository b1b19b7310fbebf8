use std::path::PathBuf;

/// Result type alias for utility operations
pub type Result<T> = std::result::Result<T, UtilsError>;

/// Error type shared by the filesystem helpers in this crate
#[derive(Debug, thiserror::Error)]
pub enum UtilsError {
    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// A duration string could not be parsed
    #[error("invalid duration '{input}': {reason}")]
    InvalidDuration { input: String, reason: String },

    /// Logging could not be initialized
    #[error("failed to initialize tracing: {message}")]
    Tracing { message: String },
}

impl UtilsError {
    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        UtilsError::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create a duration parse error
    #[must_use]
    pub fn invalid_duration(input: impl Into<String>, reason: impl Into<String>) -> Self {
        UtilsError::InvalidDuration {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
