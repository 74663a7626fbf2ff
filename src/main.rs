//!
//! Station cache daemon: sweeps stale stations and refreshes them
//! through the rate-limited upstream client.
//! Reads configuration from TOML file (~/.config/evmap-cache/config.toml).

use std::sync::Arc;
use std::time::Duration;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use evmap_cache::infrastructure::database::migrator::Migrator;
use evmap_cache::infrastructure::shutdown::{listen_for_shutdown_signals, ShutdownSignal};
use evmap_cache::{
    default_config_path, init_database, AppConfig, BackgroundUpdater, DatabaseConfig,
    HttpUpstreamApi, StationCache,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("EVMAP_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting EVMap station cache...");

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig::from_env_or_sqlite(&app_cfg.database.path);
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    // ── Cache and upstream client ──────────────────────────────
    let cache = Arc::new(
        StationCache::new(db.clone())
            .with_expiry_hours(app_cfg.cache.expiry_hours)
            .with_rate_limits(
                app_cfg.rate_limit.max_requests,
                Duration::from_secs(app_cfg.rate_limit.window_seconds),
            ),
    );
    let upstream = Arc::new(HttpUpstreamApi::new(app_cfg.upstream.base_url.clone())?);

    let stats = cache.get_stats().await?;
    info!(
        "Cache holds {} stations ({} fresh), {} price quotes",
        stats.total_stations, stats.fresh_stations, stats.total_prices
    );

    // ── Background updater ─────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));

    let updater = BackgroundUpdater::with_config(
        cache,
        upstream,
        shutdown.clone(),
        app_cfg.updater_config(),
    );
    let updater_task = updater.start();

    info!("Updater started. Press Ctrl+C to shutdown gracefully.");
    shutdown.notified().wait().await;

    // Give the refresh loop a moment to finish its current entry
    match tokio::time::timeout(Duration::from_secs(10), updater_task).await {
        Ok(Ok(())) => info!("Background updater stopped"),
        Ok(Err(e)) => error!("Background updater task panicked: {}", e),
        Err(_) => warn!("Background updater did not stop in time"),
    }

    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("EVMap station cache shutdown complete");
    Ok(())
}
