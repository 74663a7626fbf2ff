//! Create update log table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UpdateLog::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UpdateLog::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UpdateLog::PoolId).string().not_null())
                    .col(ColumnDef::new(UpdateLog::Kind).string().not_null())
                    .col(ColumnDef::new(UpdateLog::Success).boolean().not_null())
                    .col(ColumnDef::new(UpdateLog::ErrorMessage).string())
                    .col(
                        ColumnDef::new(UpdateLog::DurationMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(UpdateLog::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Pruning deletes by age
        manager
            .create_index(
                Index::create()
                    .name("idx_update_log_created")
                    .table(UpdateLog::Table)
                    .col(UpdateLog::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UpdateLog::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum UpdateLog {
    Table,
    Id,
    PoolId,
    Kind,
    Success,
    ErrorMessage,
    DurationMs,
    CreatedAt,
}
