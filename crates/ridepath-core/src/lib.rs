//! Ridepath Core - shared model for the driver client
//!
//! Everything the driver-side services agree on:
//! - Wire types exchanged with the ride backend
//! - Service seams (`DriverApi`, `ChatApi`, `TokenProvider`, `Clock`)
//! - Error taxonomy for transport failures
//! - Workspace configuration
//! - ETA formatting helpers
//!
//! # Example
//!
//! ```rust
//! use ridepath_core::format::format_eta;
//!
//! assert_eq!(format_eta(125), "2h 5m");
//! assert_eq!(format_eta(45), "45 min");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod api;
pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod types;

// Re-exports for convenience
pub use api::{ChatApi, DriverApi, StaticToken, TokenProvider};
pub use clock::{Clock, SystemClock};
pub use config::{ApiConfig, CacheConfig, ChatConfig, RidepathConfig, SetupConfig};
pub use error::{ApiError, ConfigError, TooFewCities};
pub use types::{
    AttendancePayload, ChatMessage, City, CityId, Conversation, Coordinates, EtaCacheEntry,
    NewEtaCacheEntry, OptimizedRoute, RideType, RouteCities, RouteCitiesResponse,
    RouteDefinition, SaveRouteResponse, Stop, StopStatus, StopType,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with Ridepath services
    pub use crate::{
        ApiError, City, Clock, Coordinates, DriverApi, RideType, RouteCities, Stop, StopStatus,
        StopType, SystemClock,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
