//! Station repository interface

use std::collections::HashMap;

use async_trait::async_trait;

use super::model::{BoundingBox, Coordinates, StationFields, StationRecord};
use crate::domain::CacheResult;

#[async_trait]
pub trait StationRepository: Send + Sync {
    async fn get(&self, pool_id: &str) -> CacheResult<Option<StationRecord>>;

    /// Batch lookup. Missing ids are simply absent from the result.
    async fn get_many(&self, pool_ids: &[String])
        -> CacheResult<HashMap<String, StationRecord>>;

    /// Stations inside an inclusive bounding box. Rows without coordinates
    /// are excluded.
    async fn get_in_bounds(
        &self,
        bounds: BoundingBox,
        market: Option<&str>,
    ) -> CacheResult<Vec<StationRecord>>;

    /// All stations with known coordinates, optionally filtered by market.
    async fn get_all(&self, market: Option<&str>) -> CacheResult<Vec<StationRecord>>;

    /// Upsert. Coordinates and charge point count coalesce with the stored
    /// row when the new call passes `None`; everything else is overwritten.
    async fn save(
        &self,
        pool_id: &str,
        market: &str,
        fields: StationFields,
        coordinates: Option<Coordinates>,
        charge_point_count: Option<i32>,
        operator_id: Option<&str>,
    ) -> CacheResult<()>;

    /// True when the station is absent or older than `max_age_hours`.
    async fn is_stale(&self, pool_id: &str, max_age_hours: i64) -> CacheResult<bool>;

    /// Pool ids older than `max_age_hours`, oldest first.
    async fn stale_ids(
        &self,
        market: Option<&str>,
        max_age_hours: i64,
        limit: u64,
    ) -> CacheResult<Vec<String>>;

    async fn count(&self) -> CacheResult<u64>;

    /// Stations updated within the freshness window.
    async fn count_fresh(&self, max_age_hours: i64) -> CacheResult<u64>;
}
