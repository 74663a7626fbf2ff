//! Infrastructure layer
//!
//! Database access, the upstream HTTP client, and process shutdown
//! plumbing.

pub mod database;
pub mod shutdown;
pub mod upstream;

pub use database::{init_database, DatabaseConfig};
pub use shutdown::{listen_for_shutdown_signals, ShutdownSignal};
pub use upstream::HttpUpstreamApi;
