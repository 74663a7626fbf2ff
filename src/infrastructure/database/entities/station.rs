//! Cached station (pool) entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Pool details as last seen from the upstream map API.
///
/// List-typed fields (plug types, charge point ids) are persisted as JSON
/// text blobs; the domain layer decodes them.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stations")]
pub struct Model {
    /// Upstream pool identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub pool_id: String,

    /// Market code (e.g. "de")
    pub market: String,

    /// Operator (CPO) identifier, set on first insert and kept thereafter
    pub operator_id: Option<String>,

    /// Operator display name
    pub operator_name: Option<String>,

    pub location_name: Option<String>,

    pub street: Option<String>,

    pub city: Option<String>,

    pub zip_code: Option<String>,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,

    /// Highest connector power seen across the pool (kW)
    pub max_power: Option<i32>,

    /// JSON array of plug type names
    #[sea_orm(column_type = "Text")]
    pub plug_types: String,

    /// JSON array of AC charge point ids, upstream order
    #[sea_orm(column_type = "Text")]
    pub charge_points_ac: String,

    /// JSON array of DC charge point ids, upstream order
    #[sea_orm(column_type = "Text")]
    pub charge_points_dc: String,

    pub contact_name: Option<String>,

    pub contact_phone: Option<String>,

    pub charge_point_count: Option<i32>,

    /// Full upstream response for reference
    #[sea_orm(column_type = "Text")]
    pub raw_data: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
