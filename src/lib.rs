//! # EVMap Station Cache
//!
//! Caching layer for an EV charging station map and pricing API. Keeps a
//! persistent store of stations and price quotes, tracks their freshness,
//! and refreshes them in the background through a rate-limited upstream
//! client.
//!
//! ## Architecture
//!
//! - **domain**: Core models and repository traits
//! - **application**: The cache facade, rate limiter and refresh loop
//! - **infrastructure**: SQLite persistence, the upstream HTTP client
//!   and shutdown plumbing

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{default_config_path, AppConfig, ConfigError};

pub use application::{
    BackgroundUpdater, RateLimiter, SharedStationCache, StationCache, UpdaterConfig, UpstreamApi,
};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, HttpUpstreamApi};

pub use domain::{CacheError, CacheResult};

#[cfg(test)]
pub(crate) mod test_support {
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;

    use crate::infrastructure::database::migrator::Migrator;

    /// Fresh in-memory database with all migrations applied.
    pub async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("in-memory database should connect");
        Migrator::up(&db, None)
            .await
            .expect("migrations should apply");
        db
    }
}
