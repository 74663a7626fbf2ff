pub mod rate_limiter;
pub mod updater;

pub use rate_limiter::RateLimiter;
pub use updater::{BackgroundUpdater, UpdaterConfig};
