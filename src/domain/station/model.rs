//! Station (pool) models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current type of a charge point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PowerType {
    Ac,
    Dc,
}

impl PowerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ac => "AC",
            Self::Dc => "DC",
        }
    }

    /// Reference power (kW) used when quoting prices for this current type.
    pub fn reference_power_kw(&self) -> i32 {
        match self {
            Self::Ac => 11,
            Self::Dc => 50,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AC" => Some(Self::Ac),
            "DC" => Some(Self::Dc),
            _ => None,
        }
    }
}

impl std::fmt::Display for PowerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic position of a pool. Latitude and longitude always travel
/// together; a station whose position is not yet known carries `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Inclusive NW/SE bounding box as supplied by the map viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_nw: f64,
    pub lng_nw: f64,
    pub lat_se: f64,
    pub lng_se: f64,
}

/// One cached charging location, keyed by its upstream pool id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub pool_id: String,
    /// Market code (e.g. "de")
    pub market: String,
    /// Operator (CPO) identifier, set on first insert and kept thereafter
    pub operator_id: Option<String>,
    pub operator_name: Option<String>,
    pub location_name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub coordinates: Option<Coordinates>,
    /// Highest connector power seen across the pool (kW)
    pub max_power: Option<i32>,
    pub plug_types: Vec<String>,
    /// AC charge point ids in upstream order, no duplicates
    pub charge_points_ac: Vec<String>,
    /// DC charge point ids in upstream order, no duplicates
    pub charge_points_dc: Vec<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub charge_point_count: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StationRecord {
    /// Charge point ids for one current type, in upstream order.
    pub fn charge_points(&self, power_type: PowerType) -> &[String] {
        match power_type {
            PowerType::Ac => &self.charge_points_ac,
            PowerType::Dc => &self.charge_points_dc,
        }
    }

    /// Representative charge point used for price quotes.
    pub fn first_charge_point(&self, power_type: PowerType) -> Option<&str> {
        self.charge_points(power_type).first().map(String::as_str)
    }
}

/// Normalized station fields as produced by the upstream payload
/// normalizer and consumed by `save_station`. The raw payload snapshot
/// rides along untouched for reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationFields {
    pub operator_name: Option<String>,
    pub location_name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub max_power: Option<i32>,
    pub plug_types: Vec<String>,
    pub charge_points_ac: Vec<String>,
    pub charge_points_dc: Vec<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    /// Full upstream response, stored as an opaque snapshot
    #[serde(default)]
    pub raw: serde_json::Value,
}
