//! Error types for key-value stores

use std::path::PathBuf;

/// Errors raised by a `KeyValueStore`
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error reading or writing a key
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Key cannot be mapped to storage
    #[error("invalid key: '{0}'")]
    InvalidKey(String),

    /// Store is not usable at all
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::InvalidKey("../etc".to_string());
        assert_eq!(err.to_string(), "invalid key: '../etc'");
    }
}
