pub mod entities;
pub mod migrator;
pub mod repositories;

use sea_orm::{Database, DatabaseConnection};
use tracing::info;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g. "sqlite://./station_cache.db?mode=rwc")
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./station_cache.db?mode=rwc".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
        }
    }

    /// DATABASE_URL from the environment, falling back to the configured
    /// SQLite path
    pub fn from_env_or_sqlite(path: &str) -> Self {
        match std::env::var("DATABASE_URL") {
            Ok(url) => Self { url },
            Err(_) => Self::sqlite(path),
        }
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);
    let db = Database::connect(&config.url).await?;
    info!("Database connected successfully");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_url_overrides_the_configured_path() {
        std::env::set_var("DATABASE_URL", "sqlite://./override.db?mode=rwc");
        let config = DatabaseConfig::from_env_or_sqlite("./ignored.db");
        assert_eq!(config.url, "sqlite://./override.db?mode=rwc");
        std::env::remove_var("DATABASE_URL");

        let fallback = DatabaseConfig::from_env_or_sqlite("./station_cache.db");
        assert_eq!(fallback.url, "sqlite://./station_cache.db?mode=rwc");
    }
}
