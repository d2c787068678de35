//! Ridepath ETA cache
//!
//! The only durable local state of the driver client: one ETA estimate for
//! the driver's current start/end city pair.
//!
//! # Architecture
//!
//! ```text
//! RouteCitiesResolver → EtaCache → KeyValueStore (MemoryStore | FileStore)
//!                          ↑
//!                        Clock (expiry)
//! ```
//!
//! Storage failures never reach the caller: a store that cannot be read
//! behaves like an empty cache.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod error;
pub mod eta;
pub mod store;

// Re-exports for convenience
pub use error::StoreError;
pub use eta::{EtaCache, DEFAULT_TTL, ETA_CACHE_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
