//! Station cache facade
//!
//! Single entry point over the persistent store: stations, price quotes,
//! the update queue, the update log, and the shared rate limiter. Owns
//! the freshness policy (`cache_expiry_hours`); repositories only ever
//! see explicit ages.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::application::services::RateLimiter;
use crate::domain::price::{PriceFields, PriceRecord, PriceRepository};
use crate::domain::station::{
    BoundingBox, Coordinates, PowerType, StationFields, StationRecord, StationRepository,
};
use crate::domain::update::{
    CacheStats, QueuedUpdate, UpdateKind, UpdateLogEntry, UpdateLogRepository,
    UpdateQueueRepository,
};
use crate::domain::CacheResult;
use crate::infrastructure::database::repositories::{
    SeaOrmPriceRepository, SeaOrmStationRepository, SeaOrmUpdateLogRepository,
    SeaOrmUpdateQueueRepository,
};

/// Stations older than this are considered stale and eligible for the
/// background sweep.
pub const DEFAULT_CACHE_EXPIRY_HOURS: i64 = 24;

pub type SharedStationCache = Arc<StationCache>;

pub struct StationCache {
    stations: Arc<dyn StationRepository>,
    prices: Arc<dyn PriceRepository>,
    queue: Arc<dyn UpdateQueueRepository>,
    log: Arc<dyn UpdateLogRepository>,
    limiter: Arc<RateLimiter>,
    expiry_hours: i64,
}

impl StationCache {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            stations: Arc::new(SeaOrmStationRepository::new(db.clone())),
            prices: Arc::new(SeaOrmPriceRepository::new(db.clone())),
            queue: Arc::new(SeaOrmUpdateQueueRepository::new(db.clone())),
            log: Arc::new(SeaOrmUpdateLogRepository::new(db)),
            limiter: Arc::new(RateLimiter::new()),
            expiry_hours: DEFAULT_CACHE_EXPIRY_HOURS,
        }
    }

    pub fn with_expiry_hours(mut self, hours: i64) -> Self {
        self.expiry_hours = hours;
        self
    }

    pub fn with_rate_limits(mut self, max_requests: usize, window: Duration) -> Self {
        self.limiter = Arc::new(RateLimiter::with_limits(max_requests, window));
        self
    }

    pub fn expiry_hours(&self) -> i64 {
        self.expiry_hours
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    // ── Stations ────────────────────────────────────────────────

    pub async fn get_station(&self, pool_id: &str) -> CacheResult<Option<StationRecord>> {
        self.stations.get(pool_id).await
    }

    pub async fn get_stations(
        &self,
        pool_ids: &[String],
    ) -> CacheResult<HashMap<String, StationRecord>> {
        self.stations.get_many(pool_ids).await
    }

    pub async fn get_stations_in_bounds(
        &self,
        bounds: BoundingBox,
        market: Option<&str>,
    ) -> CacheResult<Vec<StationRecord>> {
        self.stations.get_in_bounds(bounds, market).await
    }

    pub async fn all_stations(&self, market: Option<&str>) -> CacheResult<Vec<StationRecord>> {
        self.stations.get_all(market).await
    }

    pub async fn save_station(
        &self,
        pool_id: &str,
        market: &str,
        fields: StationFields,
        coordinates: Option<Coordinates>,
        charge_point_count: Option<i32>,
        operator_id: Option<&str>,
    ) -> CacheResult<()> {
        self.stations
            .save(
                pool_id,
                market,
                fields,
                coordinates,
                charge_point_count,
                operator_id,
            )
            .await
    }

    /// True when the station is missing or past the expiry window.
    pub async fn is_station_stale(&self, pool_id: &str) -> CacheResult<bool> {
        self.stations.is_stale(pool_id, self.expiry_hours).await
    }

    /// Pool ids past the expiry window, oldest first.
    pub async fn stale_station_ids(
        &self,
        market: Option<&str>,
        limit: u64,
    ) -> CacheResult<Vec<String>> {
        self.stations
            .stale_ids(market, self.expiry_hours, limit)
            .await
    }

    // ── Prices ──────────────────────────────────────────────────

    pub async fn get_price(
        &self,
        pool_id: &str,
        tariff_id: &str,
        power_type: PowerType,
        market: &str,
    ) -> CacheResult<Option<PriceRecord>> {
        self.prices.get(pool_id, tariff_id, power_type, market).await
    }

    pub async fn get_prices(
        &self,
        pool_ids: &[String],
        tariff_id: &str,
        power_type: PowerType,
        market: &str,
    ) -> CacheResult<HashMap<String, PriceRecord>> {
        self.prices
            .get_many(pool_ids, tariff_id, power_type, market)
            .await
    }

    pub async fn get_all_prices(
        &self,
        pool_ids: &[String],
        market: &str,
    ) -> CacheResult<HashMap<String, HashMap<String, PriceRecord>>> {
        self.prices.get_all_for_pools(pool_ids, market).await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn save_price(
        &self,
        pool_id: &str,
        charge_point_id: &str,
        tariff_id: &str,
        power_type: PowerType,
        power_kw: i32,
        market: &str,
        fields: PriceFields,
    ) -> CacheResult<()> {
        self.prices
            .save(
                pool_id,
                charge_point_id,
                tariff_id,
                power_type,
                power_kw,
                market,
                fields,
            )
            .await
    }

    // ── Update queue ────────────────────────────────────────────

    pub async fn queue_update(&self, pool_id: &str, market: &str, priority: i32) -> CacheResult<()> {
        self.queue.enqueue(pool_id, market, priority).await
    }

    pub async fn next_queued_update(&self) -> CacheResult<Option<QueuedUpdate>> {
        self.queue.dequeue_next().await
    }

    pub async fn remove_from_queue(&self, pool_id: &str) -> CacheResult<()> {
        self.queue.remove(pool_id).await
    }

    pub async fn queue_size(&self) -> CacheResult<u64> {
        self.queue.size().await
    }

    // ── Update log ──────────────────────────────────────────────

    pub async fn log_update(
        &self,
        pool_id: &str,
        kind: UpdateKind,
        success: bool,
        error_message: Option<&str>,
        duration_ms: i64,
    ) -> CacheResult<()> {
        self.log
            .append(pool_id, kind, success, error_message, duration_ms)
            .await
    }

    pub async fn recent_updates(&self, limit: u64) -> CacheResult<Vec<UpdateLogEntry>> {
        self.log.recent(limit).await
    }

    pub async fn prune_update_log(&self, older_than_days: i64) -> CacheResult<u64> {
        self.log.prune(older_than_days).await
    }

    // ── Stats ───────────────────────────────────────────────────

    pub async fn get_stats(&self) -> CacheResult<CacheStats> {
        let total_stations = self.stations.count().await?;
        let fresh_stations = self.stations.count_fresh(self.expiry_hours).await?;
        Ok(CacheStats {
            total_stations,
            total_prices: self.prices.count().await?,
            fresh_stations,
            stale_stations: total_stations.saturating_sub(fresh_stations),
            queue_size: self.queue.size().await?,
            cache_expiry_hours: self.expiry_hours,
        })
    }
}
