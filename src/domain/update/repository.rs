//! Update queue and update log repository interfaces

use async_trait::async_trait;

use super::model::{QueuedUpdate, UpdateKind, UpdateLogEntry};
use crate::domain::CacheResult;

#[async_trait]
pub trait UpdateQueueRepository: Send + Sync {
    /// Add a pool to the queue. If it is already queued the priority is
    /// raised to `max(old, new)`, and `added_at` resets to now only when
    /// the new priority is strictly higher - repeated low-priority re-adds
    /// keep the original ordering timestamp.
    async fn enqueue(&self, pool_id: &str, market: &str, priority: i32) -> CacheResult<()>;

    /// Pop the highest-priority entry, ties broken by oldest `added_at`.
    /// Marks the attempt (`last_attempt`, `attempt_count`) but leaves the
    /// row queued; callers remove it once the attempt completes.
    async fn dequeue_next(&self) -> CacheResult<Option<QueuedUpdate>>;

    /// Idempotent removal.
    async fn remove(&self, pool_id: &str) -> CacheResult<()>;

    async fn size(&self) -> CacheResult<u64>;
}

#[async_trait]
pub trait UpdateLogRepository: Send + Sync {
    async fn append(
        &self,
        pool_id: &str,
        kind: UpdateKind,
        success: bool,
        error_message: Option<&str>,
        duration_ms: i64,
    ) -> CacheResult<()>;

    /// Most recent entries, newest first.
    async fn recent(&self, limit: u64) -> CacheResult<Vec<UpdateLogEntry>>;

    /// Delete entries older than the retention window. Returns the number
    /// of rows removed.
    async fn prune(&self, older_than_days: i64) -> CacheResult<u64>;
}
