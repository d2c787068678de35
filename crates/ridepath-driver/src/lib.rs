//! Ridepath Driver - route services for the driver app
//!
//! The driver-side logic behind the navigation and route setup screens:
//! - Resolves the driver's route cities with a cached ETA
//! - Walks today's optimized stops, advancing only on confirmed attendance
//! - Collects and submits the ordered waypoint cities of a route
//! - Polls chat lists and rooms while their screen is focused
//!
//! # Example
//!
//! ```rust,ignore
//! use ridepath_driver::DriverServices;
//!
//! # async fn example(services: DriverServices) -> Result<(), Box<dyn std::error::Error>> {
//! let traversal = services.traversal();
//! traversal.load(None).await?;
//!
//! while let Some(stop) = traversal.current() {
//!     println!("next: {} ({})", stop.address, traversal.stop_eta_label(&stop));
//!     traversal.mark_current_complete("").await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod chat;
pub mod error;
mod guard;
pub mod navigation;
pub mod resolver;
pub mod services;
pub mod setup;
pub mod traversal;

// Re-exports for convenience
pub use chat::ChatPoller;
pub use error::{NavigationError, RouteSetupError, TraversalError};
pub use navigation::{directions_url, UrlOpener};
pub use resolver::RouteCitiesResolver;
pub use services::DriverServices;
pub use setup::RouteSetupForm;
pub use traversal::{RouteSummary, RouteTraversal, TraversalState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the driver services
    pub use crate::{
        DriverServices, RouteCitiesResolver, RouteSetupForm, RouteTraversal, TraversalError,
        TraversalState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
