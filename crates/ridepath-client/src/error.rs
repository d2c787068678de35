//! Client construction errors

/// Failure building an `HttpDriverApi`
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Base URL is not an absolute http(s) URL
    #[error("invalid base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Underlying HTTP client could not be built
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

impl ClientError {
    /// Create invalid base URL error
    pub fn invalid_base_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBaseUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
