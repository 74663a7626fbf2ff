//! Price repository interface

use std::collections::HashMap;

use async_trait::async_trait;

use super::model::{PriceFields, PriceRecord};
use crate::domain::station::PowerType;
use crate::domain::CacheResult;

#[async_trait]
pub trait PriceRepository: Send + Sync {
    async fn get(
        &self,
        pool_id: &str,
        tariff_id: &str,
        power_type: PowerType,
        market: &str,
    ) -> CacheResult<Option<PriceRecord>>;

    /// Quotes for many pools under one tariff/power type, keyed by pool id.
    async fn get_many(
        &self,
        pool_ids: &[String],
        tariff_id: &str,
        power_type: PowerType,
        market: &str,
    ) -> CacheResult<HashMap<String, PriceRecord>>;

    /// All quotes for many pools, keyed by pool id and then by
    /// `"{tariff}_{powerType}"`.
    async fn get_all_for_pools(
        &self,
        pool_ids: &[String],
        market: &str,
    ) -> CacheResult<HashMap<String, HashMap<String, PriceRecord>>>;

    /// Upsert keyed on (pool, tariff, power type, market). A write with an
    /// existing key fully replaces the price fields and raw payload.
    #[allow(clippy::too_many_arguments)]
    async fn save(
        &self,
        pool_id: &str,
        charge_point_id: &str,
        tariff_id: &str,
        power_type: PowerType,
        power_kw: i32,
        market: &str,
        fields: PriceFields,
    ) -> CacheResult<()>;

    async fn count(&self) -> CacheResult<u64>;
}
