//! Error conversion utilities

use super::types::CacheError;
use filecache_utils::UtilsError;

impl From<UtilsError> for CacheError {
    fn from(error: UtilsError) -> Self {
        match error {
            UtilsError::FileSystem {
                path,
                operation,
                source,
            } => Self::Io {
                path,
                operation,
                source,
            },
            UtilsError::InvalidDuration { .. } | UtilsError::Tracing { .. } => {
                Self::Configuration {
                    message: error.to_string(),
                }
            }
        }
    }
}
