//! Outbound ports
//!
//! Interfaces the application services depend on but do not implement.
//! The production implementation lives in `infrastructure::upstream`;
//! tests substitute their own.

use async_trait::async_trait;

use crate::domain::price::PriceFields;
use crate::domain::station::{PowerType, StationFields};
use crate::domain::CacheResult;

/// Upstream map/pricing API as seen by the refresh logic. Both calls
/// count against the shared rate limit; callers acquire a slot first.
#[async_trait]
pub trait UpstreamApi: Send + Sync {
    /// Fetch and normalize the details of one pool.
    async fn fetch_pool_details(&self, pool_id: &str, market: &str) -> CacheResult<StationFields>;

    /// Fetch and normalize one price quote for a charge point under the
    /// given tariff, at the reference power for its current type.
    async fn fetch_price(
        &self,
        charge_point_id: &str,
        tariff_id: &str,
        power_type: PowerType,
        power_kw: i32,
        market: &str,
    ) -> CacheResult<PriceFields>;
}
