//! Error types for Ridepath Core
//!
//! Provides the error taxonomy shared by every service:
//! - Transport failures talking to the ride backend
//! - Non-success HTTP statuses and undecodable bodies
//! - Configuration loading failures

use std::path::PathBuf;

/// Failure talking to the ride backend
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with a non-2xx status
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    Decode(String),

    /// Backend reported `success: false`
    #[error("request rejected: {0}")]
    Unsuccessful(String),

    /// Request exceeded the configured timeout
    #[error("request timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },
}

impl ApiError {
    /// Check if the driver can reasonably retry the same request
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Decode(_) | Self::Unsuccessful(_) => false,
        }
    }

    /// Message suitable for showing to the driver
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::Timeout { .. } => {
                "Network error. Please check your connection and try again.".to_string()
            }
            Self::Unsuccessful(message) if !message.is_empty() => message.clone(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Route definition with fewer cities than a start and a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Please select at least {min} cities")]
pub struct TooFewCities {
    /// Minimum number of cities
    pub min: usize,
    /// Number of cities selected
    pub selected: usize,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config parsed but holds an unusable value
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display() {
        let err = ApiError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn api_error_is_retryable() {
        assert!(ApiError::Transport("reset".to_string()).is_retryable());
        assert!(ApiError::Timeout { duration_secs: 5 }.is_retryable());
        assert!(ApiError::Status {
            status: 503,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Status {
            status: 404,
            body: String::new()
        }
        .is_retryable());
        assert!(!ApiError::Decode("eof".to_string()).is_retryable());
    }

    #[test]
    fn user_message_prefers_server_text() {
        let err = ApiError::Unsuccessful("Route not configured".to_string());
        assert_eq!(err.user_message(), "Route not configured");

        let err = ApiError::Decode("missing field".to_string());
        assert_eq!(err.user_message(), "Something went wrong. Please try again.");
    }
}
