//! Create prices table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Prices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prices::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Prices::PoolId).string().not_null())
                    .col(ColumnDef::new(Prices::ChargePointId).string().not_null())
                    .col(ColumnDef::new(Prices::TariffId).string().not_null())
                    .col(ColumnDef::new(Prices::PowerType).string().not_null())
                    .col(ColumnDef::new(Prices::Power).integer().not_null())
                    .col(ColumnDef::new(Prices::Market).string().not_null())
                    .col(
                        ColumnDef::new(Prices::Currency)
                            .string()
                            .not_null()
                            .default("EUR"),
                    )
                    .col(ColumnDef::new(Prices::EnergyPrice).double())
                    .col(ColumnDef::new(Prices::SessionFee).double())
                    .col(ColumnDef::new(Prices::BlockingFee).double())
                    .col(ColumnDef::new(Prices::BlockingAfterMinutes).integer())
                    .col(
                        ColumnDef::new(Prices::RawData)
                            .text()
                            .not_null()
                            .default("null"),
                    )
                    .col(
                        ColumnDef::new(Prices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // One representative quote per pool/tariff/power-type/market
        manager
            .create_index(
                Index::create()
                    .name("idx_prices_quote_key")
                    .table(Prices::Table)
                    .col(Prices::PoolId)
                    .col(Prices::TariffId)
                    .col(Prices::PowerType)
                    .col(Prices::Market)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prices_pool")
                    .table(Prices::Table)
                    .col(Prices::PoolId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prices_updated")
                    .table(Prices::Table)
                    .col(Prices::UpdatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Prices::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Prices {
    Table,
    Id,
    PoolId,
    ChargePointId,
    TariffId,
    PowerType,
    Power,
    Market,
    Currency,
    EnergyPrice,
    SessionFee,
    BlockingFee,
    BlockingAfterMinutes,
    RawData,
    CreatedAt,
    UpdatedAt,
}
