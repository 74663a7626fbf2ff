//! Price quote models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::station::PowerType;

/// One cached price quote. Unique per
/// (pool, tariff, power type, market) - a pool exposes one representative
/// quote per tariff/power-type combination, not one per charge point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub pool_id: String,
    /// Charge point the quote was requested for
    pub charge_point_id: String,
    pub tariff_id: String,
    pub power_type: PowerType,
    /// Reference power the quote was requested at (kW)
    pub power_kw: i32,
    pub market: String,
    pub currency: String,
    /// Price per kWh
    pub energy_price: Option<f64>,
    /// Flat fee per charging session
    pub session_fee: Option<f64>,
    /// Time-based fee once the grace period is exceeded
    pub blocking_fee: Option<f64>,
    /// Minutes before the blocking fee starts
    pub blocking_after_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PriceRecord {
    /// Key used by the per-pool price maps: `"{tariff}_{powerType}"`,
    /// e.g. `"HYUNDAI_FLEX_AC"`.
    pub fn tariff_key(&self) -> String {
        format!("{}_{}", self.tariff_id, self.power_type.as_str())
    }
}

/// Normalized price fields as produced by the upstream payload normalizer
/// and consumed by `save_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceFields {
    pub currency: String,
    pub energy_price: Option<f64>,
    pub session_fee: Option<f64>,
    pub blocking_fee: Option<f64>,
    pub blocking_after_minutes: Option<i32>,
    /// Full upstream response, stored as an opaque snapshot
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl Default for PriceFields {
    fn default() -> Self {
        Self {
            currency: "EUR".to_string(),
            energy_price: None,
            session_fee: None,
            blocking_fee: None,
            blocking_after_minutes: None,
            raw: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tariff_key_concatenates_tariff_and_power_type() {
        let record = PriceRecord {
            pool_id: "P1".to_string(),
            charge_point_id: "CP1".to_string(),
            tariff_id: "HYUNDAI_FLEX".to_string(),
            power_type: PowerType::Ac,
            power_kw: 11,
            market: "de".to_string(),
            currency: "EUR".to_string(),
            energy_price: Some(0.49),
            session_fee: None,
            blocking_fee: None,
            blocking_after_minutes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(record.tariff_key(), "HYUNDAI_FLEX_AC");
    }
}
