//! Cached price quote entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One price quote per (pool, tariff, power type, market); the unique
/// index lives in the migration.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "prices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub pool_id: String,

    /// Charge point the quote was requested for
    pub charge_point_id: String,

    pub tariff_id: String,

    /// "AC" or "DC"
    pub power_type: String,

    /// Reference power the quote was requested at (kW)
    pub power: i32,

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

    /// Full upstream response for reference
    #[sea_orm(column_type = "Text")]
    pub raw_data: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
