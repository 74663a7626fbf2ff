//! Application layer
//!
//! The cache facade, the background refresh services, and the outbound
//! ports they depend on.

pub mod cache;
pub mod ports;
pub mod services;

pub use cache::{SharedStationCache, StationCache, DEFAULT_CACHE_EXPIRY_HOURS};
pub use ports::UpstreamApi;
pub use services::{BackgroundUpdater, RateLimiter, UpdaterConfig};
