//! Update queue and audit log models

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Why an update attempt ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    /// Queued by the staleness sweep and drained in the background
    Sweep,
    /// Requested synchronously by a caller
    Manual,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sweep => "sweep",
            Self::Manual => "manual",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sweep" => Some(Self::Sweep),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }
}

impl std::fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pool pending refresh. A pool is queued at most once; re-enqueueing
/// merges priorities (see `UpdateQueueRepository::enqueue`).
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedUpdate {
    pub pool_id: String,
    pub market: String,
    /// Higher runs sooner
    pub priority: i32,
    pub added_at: DateTime<Utc>,
    pub last_attempt: Option<DateTime<Utc>>,
    pub attempt_count: i32,
}

/// Append-only audit record of one update attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateLogEntry {
    pub pool_id: String,
    pub kind: UpdateKind,
    pub success: bool,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub created_at: DateTime<Utc>,
}

/// Cache-wide statistics for the monitoring surface.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_stations: u64,
    pub total_prices: u64,
    pub fresh_stations: u64,
    pub stale_stations: u64,
    pub queue_size: u64,
    pub cache_expiry_hours: i64,
}

/// Snapshot of the background updater for the monitoring surface.
#[derive(Debug, Clone, Serialize)]
pub struct UpdaterStatus {
    pub running: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub updates_today: u64,
    pub errors_today: u64,
    pub queue_size: u64,
    pub stale_stations: u64,
    pub total_stations: u64,
    pub fresh_stations: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_kind_round_trips_through_strings() {
        assert_eq!(UpdateKind::parse("sweep"), Some(UpdateKind::Sweep));
        assert_eq!(UpdateKind::parse("manual"), Some(UpdateKind::Manual));
        assert_eq!(UpdateKind::parse("full"), None);
        assert_eq!(UpdateKind::Sweep.to_string(), "sweep");
    }
}
