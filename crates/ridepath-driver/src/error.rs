//! Error types for the driver services
//!
//! Every error here is recoverable: the caller shows `user_message()` and the
//! driver retries.

use ridepath_core::{ApiError, TooFewCities};

/// Generic message when the backend refuses a route without saying why
pub const GENERIC_SAVE_FAILURE: &str = "Failed to save route";

/// Route traversal failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TraversalError {
    /// Today's route could not be fetched
    #[error("failed to load today's route: {0}")]
    Load(ApiError),

    /// Backend did not confirm attendance; the cursor did not move
    #[error("failed to mark attendance: {0}")]
    Attendance(ApiError),

    /// Route not loaded yet, or already completed
    #[error("no current stop")]
    NoCurrentStop,

    /// A load or attendance call is still pending
    #[error("another route operation is still in progress")]
    Busy,
}

impl TraversalError {
    /// Check if retrying the same action can succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Load(e) | Self::Attendance(e) => e.is_retryable(),
            Self::Busy => true,
            Self::NoCurrentStop => false,
        }
    }

    /// Message suitable for an inline error banner
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Load(e) => format!("Could not load today's route. {}", e.user_message()),
            Self::Attendance(e) => format!("Could not mark attendance. {}", e.user_message()),
            Self::NoCurrentStop => "There is no stop to complete.".to_string(),
            Self::Busy => "Please wait for the previous action to finish.".to_string(),
        }
    }
}

/// Route setup failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteSetupError {
    /// Rejected locally, nothing was sent
    #[error("{0}")]
    Validation(String),

    /// Backend answered `success: false`
    #[error("{0}")]
    Rejected(String),

    /// Request failed in transport
    #[error("failed to save route: {0}")]
    Api(#[from] ApiError),

    /// A previous submit is still pending
    #[error("route is already being saved")]
    Busy,
}

impl RouteSetupError {
    /// Message suitable for an alert
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Rejected(message) => message.clone(),
            Self::Api(_) => GENERIC_SAVE_FAILURE.to_string(),
            Self::Busy => "Please wait for the previous save to finish.".to_string(),
        }
    }
}

impl From<TooFewCities> for RouteSetupError {
    fn from(value: TooFewCities) -> Self {
        Self::Validation(value.to_string())
    }
}

/// External navigation failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// Platform refused to open the maps link
    #[error("could not open maps for {url}: {reason}")]
    OpenFailed { url: String, reason: String },
}
