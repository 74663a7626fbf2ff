//! SeaORM implementations of the update queue and update log

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::update::{
    QueuedUpdate, UpdateKind, UpdateLogEntry, UpdateLogRepository, UpdateQueueRepository,
};
use crate::domain::CacheResult;
use crate::infrastructure::database::entities::{update_log, update_queue};

// ── Update queue ────────────────────────────────────────────────

pub struct SeaOrmUpdateQueueRepository {
    db: DatabaseConnection,
}

impl SeaOrmUpdateQueueRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn queue_model_to_entry(m: update_queue::Model) -> QueuedUpdate {
    QueuedUpdate {
        pool_id: m.pool_id,
        market: m.market,
        priority: m.priority,
        added_at: m.added_at,
        last_attempt: m.last_attempt,
        attempt_count: m.attempt_count,
    }
}

#[async_trait]
impl UpdateQueueRepository for SeaOrmUpdateQueueRepository {
    async fn enqueue(&self, pool_id: &str, market: &str, priority: i32) -> CacheResult<()> {
        let now = Utc::now();
        let txn = self.db.begin().await?;
        let existing = update_queue::Entity::find_by_id(pool_id).one(&txn).await?;
        match existing {
            Some(row) => {
                // Merge rule: priority becomes max(old, new); the ordering
                // timestamp resets only on a strict escalation, so repeated
                // low-priority re-adds keep their place in line
                if priority > row.priority {
                    let mut model: update_queue::ActiveModel = row.into();
                    model.priority = Set(priority);
                    model.added_at = Set(now);
                    model.update(&txn).await?;
                }
            }
            None => {
                let model = update_queue::ActiveModel {
                    pool_id: Set(pool_id.to_string()),
                    market: Set(market.to_string()),
                    priority: Set(priority),
                    added_at: Set(now),
                    last_attempt: Set(None),
                    attempt_count: Set(0),
                };
                model.insert(&txn).await?;
            }
        }
        txn.commit().await?;
        debug!("Queued update for {} (priority {})", pool_id, priority);
        Ok(())
    }

    async fn dequeue_next(&self) -> CacheResult<Option<QueuedUpdate>> {
        let txn = self.db.begin().await?;
        let next = update_queue::Entity::find()
            .order_by_desc(update_queue::Column::Priority)
            .order_by_asc(update_queue::Column::AddedAt)
            .one(&txn)
            .await?;
        let Some(row) = next else {
            txn.commit().await?;
            return Ok(None);
        };
        let attempt_count = row.attempt_count + 1;
        let now = Utc::now();
        let mut model: update_queue::ActiveModel = row.into();
        model.last_attempt = Set(Some(now));
        model.attempt_count = Set(attempt_count);
        let updated = model.update(&txn).await?;
        txn.commit().await?;
        Ok(Some(queue_model_to_entry(updated)))
    }

    async fn remove(&self, pool_id: &str) -> CacheResult<()> {
        update_queue::Entity::delete_by_id(pool_id)
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn size(&self) -> CacheResult<u64> {
        Ok(update_queue::Entity::find().count(&self.db).await?)
    }
}

// ── Update log ──────────────────────────────────────────────────

pub struct SeaOrmUpdateLogRepository {
    db: DatabaseConnection,
}

impl SeaOrmUpdateLogRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UpdateLogRepository for SeaOrmUpdateLogRepository {
    async fn append(
        &self,
        pool_id: &str,
        kind: UpdateKind,
        success: bool,
        error_message: Option<&str>,
        duration_ms: i64,
    ) -> CacheResult<()> {
        let model = update_log::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            pool_id: Set(pool_id.to_string()),
            kind: Set(kind.as_str().to_string()),
            success: Set(success),
            error_message: Set(error_message.map(str::to_string)),
            duration_ms: Set(duration_ms),
            created_at: Set(Utc::now()),
        };
        model.insert(&self.db).await?;
        Ok(())
    }

    async fn recent(&self, limit: u64) -> CacheResult<Vec<UpdateLogEntry>> {
        let models = update_log::Entity::find()
            .order_by_desc(update_log::Column::CreatedAt)
            .order_by_desc(update_log::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(models
            .into_iter()
            .map(|m| UpdateLogEntry {
                pool_id: m.pool_id,
                kind: UpdateKind::parse(&m.kind).unwrap_or(UpdateKind::Sweep),
                success: m.success,
                error_message: m.error_message,
                duration_ms: m.duration_ms,
                created_at: m.created_at,
            })
            .collect())
    }

    async fn prune(&self, older_than_days: i64) -> CacheResult<u64> {
        let cutoff = Utc::now() - Duration::days(older_than_days);
        let result = update_log::Entity::delete_many()
            .filter(update_log::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;

    #[tokio::test]
    async fn lower_priority_re_add_keeps_priority_and_timestamp() {
        let db = setup_db().await;
        let queue = SeaOrmUpdateQueueRepository::new(db);

        queue.enqueue("P", "de", 3).await.unwrap();
        let first = queue.dequeue_next().await.unwrap().unwrap();

        queue.enqueue("P", "de", 1).await.unwrap();
        let second = queue.dequeue_next().await.unwrap().unwrap();

        assert_eq!(second.priority, 3);
        assert_eq!(second.added_at, first.added_at);
        assert_eq!(queue.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn higher_priority_re_add_escalates_and_resets_timestamp() {
        let db = setup_db().await;
        let queue = SeaOrmUpdateQueueRepository::new(db);

        queue.enqueue("P", "de", 1).await.unwrap();
        let first = queue.dequeue_next().await.unwrap().unwrap();

        queue.enqueue("P", "de", 5).await.unwrap();
        let second = queue.dequeue_next().await.unwrap().unwrap();

        assert_eq!(second.priority, 5);
        assert!(second.added_at > first.added_at);
    }

    #[tokio::test]
    async fn dequeue_pops_highest_priority_then_fifo() {
        let db = setup_db().await;
        let queue = SeaOrmUpdateQueueRepository::new(db);

        queue.enqueue("A", "de", 5).await.unwrap();
        queue.enqueue("B", "de", 5).await.unwrap();
        queue.enqueue("C", "de", 9).await.unwrap();

        let first = queue.dequeue_next().await.unwrap().unwrap();
        assert_eq!(first.pool_id, "C");
        queue.remove("C").await.unwrap();

        // Equal priority: insertion order wins
        let second = queue.dequeue_next().await.unwrap().unwrap();
        assert_eq!(second.pool_id, "A");
        queue.remove("A").await.unwrap();

        let third = queue.dequeue_next().await.unwrap().unwrap();
        assert_eq!(third.pool_id, "B");
        queue.remove("B").await.unwrap();

        assert!(queue.dequeue_next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dequeue_marks_the_attempt_without_removing() {
        let db = setup_db().await;
        let queue = SeaOrmUpdateQueueRepository::new(db);

        queue.enqueue("P", "de", 1).await.unwrap();
        let entry = queue.dequeue_next().await.unwrap().unwrap();
        assert_eq!(entry.attempt_count, 1);
        assert!(entry.last_attempt.is_some());
        assert_eq!(queue.size().await.unwrap(), 1);

        let again = queue.dequeue_next().await.unwrap().unwrap();
        assert_eq!(again.attempt_count, 2);
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let db = setup_db().await;
        let queue = SeaOrmUpdateQueueRepository::new(db);

        queue.enqueue("P", "de", 1).await.unwrap();
        queue.remove("P").await.unwrap();
        queue.remove("P").await.unwrap();
        queue.remove("NEVER_QUEUED").await.unwrap();
        assert_eq!(queue.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn log_appends_and_prunes_by_age() {
        let db = setup_db().await;
        let log = SeaOrmUpdateLogRepository::new(db.clone());

        log.append("P1", UpdateKind::Sweep, true, None, 1200)
            .await
            .unwrap();
        log.append("P2", UpdateKind::Manual, false, Some("HTTP 502"), 300)
            .await
            .unwrap();

        let recent = log.recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].pool_id, "P2");
        assert_eq!(recent[0].kind, UpdateKind::Manual);
        assert_eq!(recent[0].error_message.as_deref(), Some("HTTP 502"));

        // Nothing is old enough to prune yet
        assert_eq!(log.prune(7).await.unwrap(), 0);

        // Backdate one row past the retention window
        let rows = update_log::Entity::find().all(&db).await.unwrap();
        let mut model: update_log::ActiveModel = rows[0].clone().into();
        model.created_at = Set(Utc::now() - Duration::days(8));
        model.update(&db).await.unwrap();

        assert_eq!(log.prune(7).await.unwrap(), 1);
        assert_eq!(log.recent(10).await.unwrap().len(), 1);
    }
}
