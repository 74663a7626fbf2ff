//! Pending refresh queue entity

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per pool awaiting refresh. The primary key keeps a pool from
/// being queued twice; re-enqueueing merges priorities instead.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "update_queue")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub pool_id: String,

    pub market: String,

    /// Higher runs sooner
    pub priority: i32,

    /// Ordering timestamp for priority ties
    pub added_at: DateTime<Utc>,

    pub last_attempt: Option<DateTime<Utc>>,

    pub attempt_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
