//! Update scheduling aggregate
//!
//! Pending-refresh queue entries, the append-only update log, and the
//! statistics types exposed to callers.

pub mod model;
pub mod repository;

pub use model::{CacheStats, QueuedUpdate, UpdateKind, UpdateLogEntry, UpdaterStatus};
pub use repository::{UpdateLogRepository, UpdateQueueRepository};
