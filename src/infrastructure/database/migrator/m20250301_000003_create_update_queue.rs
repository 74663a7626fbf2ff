//! Create update queue table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UpdateQueue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UpdateQueue::PoolId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UpdateQueue::Market).string().not_null())
                    .col(
                        ColumnDef::new(UpdateQueue::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UpdateQueue::AddedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UpdateQueue::LastAttempt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(UpdateQueue::AttemptCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        // Drain order: highest priority first, then oldest
        manager
            .create_index(
                Index::create()
                    .name("idx_queue_priority")
                    .table(UpdateQueue::Table)
                    .col(UpdateQueue::Priority)
                    .col(UpdateQueue::AddedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UpdateQueue::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UpdateQueue {
    Table,
    PoolId,
    Market,
    Priority,
    AddedAt,
    LastAttempt,
    AttemptCount,
}
