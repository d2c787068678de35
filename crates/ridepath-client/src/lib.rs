//! Ridepath HTTP client
//!
//! `HttpDriverApi` implements the `DriverApi` and `ChatApi` seams over the
//! ride backend's REST endpoints using `reqwest`.
//!
//! # Example
//!
//! ```rust,ignore
//! use ridepath_client::HttpDriverApi;
//! use ridepath_core::{ApiConfig, DriverApi};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = HttpDriverApi::new(&ApiConfig::default())?;
//! let route = api.optimize_route(None).await?;
//! println!("{} stops today", route.stops.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod http;

pub use error::ClientError;
pub use http::HttpDriverApi;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
