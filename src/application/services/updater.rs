//! Background refresh loop
//!
//! Sweeps stale stations into the update queue and drains it one entry
//! per cycle, respecting the shared rate limit. Also serves the manual
//! refresh path so callers can bypass the queue when a slot is free.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::application::cache::SharedStationCache;
use crate::application::ports::UpstreamApi;
use crate::domain::station::{PowerType, StationRecord};
use crate::domain::update::{UpdateKind, UpdaterStatus};
use crate::domain::{CacheError, CacheResult};
use crate::infrastructure::shutdown::ShutdownSignal;

#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Fallback market for queue entries whose station record is missing
    pub default_market: String,
    /// Tariffs quoted on every refresh
    pub tariffs: Vec<String>,
    /// Stations queued per sweep
    pub sweep_limit: u64,
    /// Priority assigned to sweep entries; manual callers queue higher
    pub sweep_priority: i32,
    /// Pause before the first cycle, so startup traffic settles
    pub startup_grace: Duration,
    /// Pause when the queue is empty
    pub idle_wait: Duration,
    /// Pause after a failed cycle
    pub error_backoff: Duration,
    pub log_retention_days: i64,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            default_market: "de".to_string(),
            tariffs: vec!["HYUNDAI_FLEX".to_string(), "HYUNDAI_SMART".to_string()],
            sweep_limit: 50,
            sweep_priority: 1,
            startup_grace: Duration::from_secs(5),
            idle_wait: Duration::from_secs(60),
            error_backoff: Duration::from_secs(30),
            log_retention_days: 7,
        }
    }
}

/// Cloneable handle to the refresh loop. All state lives behind `Arc`s,
/// so a clone observes and drives the same loop.
#[derive(Clone)]
pub struct BackgroundUpdater {
    cache: SharedStationCache,
    upstream: Arc<dyn UpstreamApi>,
    shutdown: ShutdownSignal,
    config: Arc<UpdaterConfig>,
    running: Arc<AtomicBool>,
    updates_today: Arc<AtomicU64>,
    errors_today: Arc<AtomicU64>,
    last_update: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl BackgroundUpdater {
    pub fn new(
        cache: SharedStationCache,
        upstream: Arc<dyn UpstreamApi>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self::with_config(cache, upstream, shutdown, UpdaterConfig::default())
    }

    pub fn with_config(
        cache: SharedStationCache,
        upstream: Arc<dyn UpstreamApi>,
        shutdown: ShutdownSignal,
        config: UpdaterConfig,
    ) -> Self {
        Self {
            cache,
            upstream,
            shutdown,
            config: Arc::new(config),
            running: Arc::new(AtomicBool::new(false)),
            updates_today: Arc::new(AtomicU64::new(0)),
            errors_today: Arc::new(AtomicU64::new(0)),
            last_update: Arc::new(RwLock::new(None)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the refresh loop. The task exits once the shutdown signal
    /// fires.
    pub fn start(&self) -> JoinHandle<()> {
        let updater = self.clone();
        tokio::spawn(async move { updater.run().await })
    }

    pub async fn run(&self) {
        self.running.store(true, Ordering::SeqCst);
        info!("Background updater started");
        self.wait_or_shutdown(self.config.startup_grace).await;

        while !self.shutdown.is_triggered() {
            match self.cycle().await {
                Ok(true) => {}
                Ok(false) => {
                    if let Err(e) = self
                        .cache
                        .prune_update_log(self.config.log_retention_days)
                        .await
                    {
                        warn!("Update log prune failed: {}", e);
                    }
                    self.wait_or_shutdown(self.config.idle_wait).await;
                }
                Err(e) => {
                    self.errors_today.fetch_add(1, Ordering::SeqCst);
                    error!("Update cycle failed: {}", e);
                    self.wait_or_shutdown(self.config.error_backoff).await;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Background updater stopped");
    }

    /// One pass: sweep stale stations into the queue, then drain a single
    /// entry. Returns `Ok(true)` when an entry was processed.
    pub async fn cycle(&self) -> CacheResult<bool> {
        // The sweep covers every market; each entry is queued under its
        // own station's market
        let stale = self
            .cache
            .stale_station_ids(None, self.config.sweep_limit)
            .await?;
        if !stale.is_empty() {
            info!("Sweep found {} stale stations", stale.len());
        }
        for pool_id in &stale {
            let market = match self.cache.get_station(pool_id).await? {
                Some(record) => record.market,
                None => self.config.default_market.clone(),
            };
            self.cache
                .queue_update(pool_id, &market, self.config.sweep_priority)
                .await?;
        }

        let Some(entry) = self.cache.next_queued_update().await? else {
            return Ok(false);
        };
        let started = Instant::now();
        match self.refresh_station(&entry.pool_id, &entry.market).await {
            Ok(true) => {
                self.cache.remove_from_queue(&entry.pool_id).await?;
                self.cache
                    .log_update(
                        &entry.pool_id,
                        UpdateKind::Sweep,
                        true,
                        None,
                        started.elapsed().as_millis() as i64,
                    )
                    .await?;
                self.note_success().await;
                Ok(true)
            }
            // Shutdown interrupted the refresh; the entry stays queued
            // for the next run
            Ok(false) => Ok(false),
            // One station's upstream failure does not abort the loop; the
            // entry still comes off the queue and the failure is logged
            Err(CacheError::Upstream(msg)) => {
                self.errors_today.fetch_add(1, Ordering::SeqCst);
                warn!("Refresh failed for {}: {}", entry.pool_id, msg);
                self.cache.remove_from_queue(&entry.pool_id).await?;
                self.cache
                    .log_update(
                        &entry.pool_id,
                        UpdateKind::Sweep,
                        false,
                        Some(msg.as_str()),
                        started.elapsed().as_millis() as i64,
                    )
                    .await?;
                Ok(true)
            }
            // Store-level failures do abort the cycle and trigger the
            // loop's backoff
            Err(e) => {
                self.cache.remove_from_queue(&entry.pool_id).await?;
                self.cache
                    .log_update(
                        &entry.pool_id,
                        UpdateKind::Sweep,
                        false,
                        Some(&e.to_string()),
                        started.elapsed().as_millis() as i64,
                    )
                    .await?;
                Err(e)
            }
        }
    }

    /// Fetch a station's details and its price quotes, writing everything
    /// through the cache. Returns `Ok(false)` when shutdown interrupted
    /// the refresh before it completed.
    pub async fn refresh_station(&self, pool_id: &str, market: &str) -> CacheResult<bool> {
        if !self.await_slot().await {
            return Ok(false);
        }
        debug!("Refreshing station {}", pool_id);
        let result = self.upstream.fetch_pool_details(pool_id, market).await;
        // The request went out either way and counts against the window
        self.cache.rate_limiter().record_request();
        let fields = result?;
        let charge_point_count =
            (fields.charge_points_ac.len() + fields.charge_points_dc.len()) as i32;
        self.cache
            .save_station(
                pool_id,
                market,
                fields.clone(),
                None,
                Some(charge_point_count),
                None,
            )
            .await?;

        for tariff_id in &self.config.tariffs {
            for power_type in [PowerType::Ac, PowerType::Dc] {
                let charge_points = match power_type {
                    PowerType::Ac => &fields.charge_points_ac,
                    PowerType::Dc => &fields.charge_points_dc,
                };
                let Some(charge_point_id) = charge_points.first() else {
                    continue;
                };
                if !self.await_slot().await {
                    return Ok(false);
                }
                let power_kw = power_type.reference_power_kw();
                let quote = self
                    .upstream
                    .fetch_price(charge_point_id, tariff_id, power_type, power_kw, market)
                    .await;
                self.cache.rate_limiter().record_request();
                match quote {
                    Ok(price) => {
                        self.cache
                            .save_price(
                                pool_id,
                                charge_point_id,
                                tariff_id,
                                power_type,
                                power_kw,
                                market,
                                price,
                            )
                            .await?;
                    }
                    // A missing quote does not fail the whole refresh
                    Err(e) => {
                        warn!(
                            "Price fetch failed for {} {} {}: {}",
                            pool_id, tariff_id, power_type, e
                        );
                    }
                }
            }
        }
        Ok(true)
    }

    /// Refresh a station on demand. Fails fast with `RateLimited` when no
    /// request slot is free, so callers can fall back to queueing.
    pub async fn force_update(
        &self,
        pool_id: &str,
        market: &str,
    ) -> CacheResult<Option<StationRecord>> {
        if !self.cache.rate_limiter().can_proceed() {
            return Err(CacheError::RateLimited);
        }
        info!("Manual refresh requested for {}", pool_id);
        let started = Instant::now();
        match self.refresh_station(pool_id, market).await {
            Ok(true) => {
                if let Err(e) = self.cache.remove_from_queue(pool_id).await {
                    warn!("Could not drop {} from the queue: {}", pool_id, e);
                }
                if let Err(e) = self
                    .cache
                    .log_update(
                        pool_id,
                        UpdateKind::Manual,
                        true,
                        None,
                        started.elapsed().as_millis() as i64,
                    )
                    .await
                {
                    warn!("Could not log manual update for {}: {}", pool_id, e);
                }
                self.note_success().await;
                self.cache.get_station(pool_id).await
            }
            Ok(false) => Ok(None),
            Err(e) => {
                self.errors_today.fetch_add(1, Ordering::SeqCst);
                // Queue cleanup and logging stay best-effort on failure too
                if let Err(queue_err) = self.cache.remove_from_queue(pool_id).await {
                    warn!("Could not drop {} from the queue: {}", pool_id, queue_err);
                }
                if let Err(log_err) = self
                    .cache
                    .log_update(
                        pool_id,
                        UpdateKind::Manual,
                        false,
                        Some(&e.to_string()),
                        started.elapsed().as_millis() as i64,
                    )
                    .await
                {
                    warn!("Could not log manual update for {}: {}", pool_id, log_err);
                }
                Err(e)
            }
        }
    }

    pub async fn status(&self) -> CacheResult<UpdaterStatus> {
        let stats = self.cache.get_stats().await?;
        Ok(UpdaterStatus {
            running: self.running.load(Ordering::SeqCst),
            last_update: *self.last_update.read().await,
            updates_today: self.updates_today.load(Ordering::SeqCst),
            errors_today: self.errors_today.load(Ordering::SeqCst),
            queue_size: stats.queue_size,
            stale_stations: stats.stale_stations,
            total_stations: stats.total_stations,
            fresh_stations: stats.fresh_stations,
        })
    }

    /// Wait for a rate limit slot. Returns false when shutdown fires
    /// first. Callers record the request once it has actually been sent.
    async fn await_slot(&self) -> bool {
        if self.shutdown.is_triggered() {
            return false;
        }
        tokio::select! {
            _ = self.shutdown.notified().wait() => false,
            _ = self.cache.rate_limiter().await_turn() => true,
        }
    }

    async fn wait_or_shutdown(&self, duration: Duration) {
        tokio::select! {
            _ = self.shutdown.notified().wait() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }

    async fn note_success(&self) {
        self.updates_today.fetch_add(1, Ordering::SeqCst);
        *self.last_update.write().await = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::cache::StationCache;
    use crate::domain::price::PriceFields;
    use crate::domain::station::StationFields;
    use crate::infrastructure::database::entities::station;
    use crate::test_support::setup_db;
    use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
    use std::sync::atomic::AtomicUsize;

    struct MockUpstream {
        pool_calls: AtomicUsize,
        price_calls: AtomicUsize,
        fail_pool: AtomicBool,
    }

    impl MockUpstream {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                pool_calls: AtomicUsize::new(0),
                price_calls: AtomicUsize::new(0),
                fail_pool: AtomicBool::new(false),
            })
        }
    }

    #[async_trait::async_trait]
    impl UpstreamApi for MockUpstream {
        async fn fetch_pool_details(
            &self,
            _pool_id: &str,
            _market: &str,
        ) -> CacheResult<StationFields> {
            self.pool_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_pool.load(Ordering::SeqCst) {
                return Err(CacheError::Upstream("HTTP 502".to_string()));
            }
            Ok(StationFields {
                operator_name: Some("EnBW mobility+".to_string()),
                city: Some("Berlin".to_string()),
                max_power: Some(150),
                charge_points_ac: vec!["CP-AC".to_string()],
                charge_points_dc: vec!["CP-DC".to_string()],
                ..Default::default()
            })
        }

        async fn fetch_price(
            &self,
            _charge_point_id: &str,
            _tariff_id: &str,
            _power_type: PowerType,
            _power_kw: i32,
            _market: &str,
        ) -> CacheResult<PriceFields> {
            self.price_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PriceFields {
                energy_price: Some(0.49),
                ..Default::default()
            })
        }
    }

    fn test_config() -> UpdaterConfig {
        UpdaterConfig {
            startup_grace: Duration::from_millis(0),
            idle_wait: Duration::from_millis(10),
            error_backoff: Duration::from_millis(10),
            ..UpdaterConfig::default()
        }
    }

    fn build(
        db: DatabaseConnection,
    ) -> (SharedStationCache, BackgroundUpdater, Arc<MockUpstream>) {
        // Wide limits keep the tests from sleeping on the limiter
        let cache = Arc::new(
            StationCache::new(db).with_rate_limits(100, Duration::from_secs(1)),
        );
        let upstream = MockUpstream::new();
        let updater = BackgroundUpdater::with_config(
            cache.clone(),
            upstream.clone(),
            ShutdownSignal::new(),
            test_config(),
        );
        (cache, updater, upstream)
    }

    async fn backdate_station(db: &DatabaseConnection, pool_id: &str, hours: i64) {
        let row = station::Entity::find_by_id(pool_id)
            .one(db)
            .await
            .unwrap()
            .unwrap();
        let mut model: station::ActiveModel = row.into();
        model.updated_at = Set(Utc::now() - chrono::Duration::hours(hours));
        model.update(db).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_saves_the_station_and_one_quote_per_tariff_and_current() {
        let db = setup_db().await;
        let (cache, updater, upstream) = build(db);

        let refreshed = updater.refresh_station("P1", "de").await.unwrap();
        assert!(refreshed);
        assert_eq!(upstream.pool_calls.load(Ordering::SeqCst), 1);
        // Two tariffs, each quoted for AC and DC
        assert_eq!(upstream.price_calls.load(Ordering::SeqCst), 4);

        let station = cache.get_station("P1").await.unwrap().unwrap();
        assert_eq!(station.charge_point_count, Some(2));
        assert_eq!(station.operator_name.as_deref(), Some("EnBW mobility+"));

        let prices = cache
            .get_all_prices(&["P1".to_string()], "de")
            .await
            .unwrap();
        let quotes = prices.get("P1").unwrap();
        assert_eq!(quotes.len(), 4);
        assert!(quotes.contains_key("HYUNDAI_FLEX_AC"));
        assert!(quotes.contains_key("HYUNDAI_SMART_DC"));
    }

    #[tokio::test]
    async fn cycle_drains_a_queued_entry_and_clears_it() {
        let db = setup_db().await;
        let (cache, updater, _upstream) = build(db);

        cache.queue_update("P1", "de", 5).await.unwrap();
        assert!(updater.cycle().await.unwrap());

        assert_eq!(cache.queue_size().await.unwrap(), 0);
        let log = cache.recent_updates(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].success);
        assert_eq!(log[0].kind, UpdateKind::Sweep);

        let status = updater.status().await.unwrap();
        assert_eq!(status.updates_today, 1);
        assert!(status.last_update.is_some());
    }

    #[tokio::test]
    async fn cycle_sweeps_stale_stations_back_to_freshness() {
        let db = setup_db().await;
        let (cache, updater, _upstream) = build(db.clone());

        cache
            .save_station("P1", "de", StationFields::default(), None, None, None)
            .await
            .unwrap();
        backdate_station(&db, "P1", 25).await;
        assert!(cache.is_station_stale("P1").await.unwrap());

        // The sweep queues the stale station and the same cycle drains it
        assert!(updater.cycle().await.unwrap());
        assert!(!cache.is_station_stale("P1").await.unwrap());
        assert_eq!(cache.queue_size().await.unwrap(), 0);

        // Nothing left to do
        assert!(!updater.cycle().await.unwrap());
    }

    #[tokio::test]
    async fn failed_refresh_drops_the_entry_and_logs_the_failure() {
        let db = setup_db().await;
        let (cache, updater, upstream) = build(db);
        upstream.fail_pool.store(true, Ordering::SeqCst);

        cache.queue_update("P1", "de", 5).await.unwrap();
        // An upstream failure counts as a processed item, not a loop error
        assert!(updater.cycle().await.unwrap());

        assert_eq!(cache.queue_size().await.unwrap(), 0);
        let log = cache.recent_updates(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert!(!log[0].success);
        assert!(log[0].error_message.is_some());

        let status = updater.status().await.unwrap();
        assert_eq!(status.errors_today, 1);
        assert_eq!(status.updates_today, 0);
    }

    #[tokio::test]
    async fn failed_refreshes_drain_the_queue_at_item_pace() {
        let db = setup_db().await;
        let (cache, updater, upstream) = build(db);
        upstream.fail_pool.store(true, Ordering::SeqCst);

        cache.queue_update("P1", "de", 5).await.unwrap();
        cache.queue_update("P2", "de", 5).await.unwrap();

        // Each cycle keeps going despite the dead upstream
        assert!(updater.cycle().await.unwrap());
        assert!(updater.cycle().await.unwrap());
        assert!(!updater.cycle().await.unwrap());

        assert_eq!(cache.queue_size().await.unwrap(), 0);
        assert_eq!(updater.status().await.unwrap().errors_today, 2);
    }

    #[tokio::test]
    async fn sweep_covers_stations_in_every_market() {
        let db = setup_db().await;
        // Updater config still defaults to market "de"
        let (cache, updater, _upstream) = build(db.clone());

        cache
            .save_station("P1", "fr", StationFields::default(), None, None, None)
            .await
            .unwrap();
        backdate_station(&db, "P1", 25).await;
        assert!(cache.is_station_stale("P1").await.unwrap());

        assert!(updater.cycle().await.unwrap());
        assert!(!cache.is_station_stale("P1").await.unwrap());
        assert_eq!(cache.queue_size().await.unwrap(), 0);

        // The refresh ran under the station's own market
        let record = cache.get_station("P1").await.unwrap().unwrap();
        assert_eq!(record.market, "fr");
    }

    #[tokio::test]
    async fn force_update_fails_fast_when_the_window_is_full() {
        let db = setup_db().await;
        let cache = Arc::new(
            StationCache::new(db).with_rate_limits(1, Duration::from_secs(60)),
        );
        let updater = BackgroundUpdater::with_config(
            cache.clone(),
            MockUpstream::new(),
            ShutdownSignal::new(),
            test_config(),
        );

        cache.rate_limiter().record_request();
        let result = updater.force_update("P1", "de").await;
        assert!(matches!(result, Err(CacheError::RateLimited)));
    }

    #[tokio::test]
    async fn force_update_refreshes_and_logs_a_manual_row() {
        let db = setup_db().await;
        let (cache, updater, _upstream) = build(db);

        cache.queue_update("P1", "de", 9).await.unwrap();
        let record = updater.force_update("P1", "de").await.unwrap().unwrap();
        assert_eq!(record.pool_id, "P1");

        assert_eq!(cache.queue_size().await.unwrap(), 0);
        let log = cache.recent_updates(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, UpdateKind::Manual);
        assert!(log[0].success);
    }

    #[tokio::test]
    async fn failed_manual_refresh_still_clears_the_queue() {
        let db = setup_db().await;
        let (cache, updater, upstream) = build(db);
        upstream.fail_pool.store(true, Ordering::SeqCst);

        cache.queue_update("P1", "de", 9).await.unwrap();
        let result = updater.force_update("P1", "de").await;
        assert!(matches!(result, Err(CacheError::Upstream(_))));

        assert_eq!(cache.queue_size().await.unwrap(), 0);
        let log = cache.recent_updates(10).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, UpdateKind::Manual);
        assert!(!log[0].success);
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_refresh_before_it_starts() {
        let db = setup_db().await;
        let (cache, _updater, upstream) = build(db);
        let shutdown = ShutdownSignal::new();
        let updater = BackgroundUpdater::with_config(
            cache.clone(),
            upstream.clone(),
            shutdown.clone(),
            test_config(),
        );

        shutdown.trigger();
        let refreshed = updater.refresh_station("P1", "de").await.unwrap();
        assert!(!refreshed);
        assert_eq!(upstream.pool_calls.load(Ordering::SeqCst), 0);
        assert!(cache.get_station("P1").await.unwrap().is_none());
    }
}
