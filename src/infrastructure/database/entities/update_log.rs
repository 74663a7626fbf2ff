//! Update attempt audit log entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only record of one update attempt. Rows are only ever inserted
/// and pruned by age.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "update_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub pool_id: String,

    /// "sweep" or "manual"
    pub kind: String,

    pub success: bool,

    pub error_message: Option<String>,

    pub duration_ms: i64,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
