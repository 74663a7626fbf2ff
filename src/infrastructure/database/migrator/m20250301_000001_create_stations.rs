//! Create stations table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Stations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Stations::PoolId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Stations::Market).string().not_null())
                    .col(ColumnDef::new(Stations::OperatorId).string())
                    .col(ColumnDef::new(Stations::OperatorName).string())
                    .col(ColumnDef::new(Stations::LocationName).string())
                    .col(ColumnDef::new(Stations::Street).string())
                    .col(ColumnDef::new(Stations::City).string())
                    .col(ColumnDef::new(Stations::ZipCode).string())
                    .col(ColumnDef::new(Stations::Latitude).double())
                    .col(ColumnDef::new(Stations::Longitude).double())
                    .col(ColumnDef::new(Stations::MaxPower).integer())
                    .col(
                        ColumnDef::new(Stations::PlugTypes)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Stations::ChargePointsAc)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Stations::ChargePointsDc)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Stations::ContactName).string())
                    .col(ColumnDef::new(Stations::ContactPhone).string())
                    .col(ColumnDef::new(Stations::ChargePointCount).integer())
                    .col(
                        ColumnDef::new(Stations::RawData)
                            .text()
                            .not_null()
                            .default("null"),
                    )
                    .col(
                        ColumnDef::new(Stations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Stations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_stations_market")
                    .table(Stations::Table)
                    .col(Stations::Market)
                    .to_owned(),
            )
            .await?;

        // Staleness sweeps scan by age
        manager
            .create_index(
                Index::create()
                    .name("idx_stations_updated")
                    .table(Stations::Table)
                    .col(Stations::UpdatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Stations::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Stations {
    Table,
    PoolId,
    Market,
    OperatorId,
    OperatorName,
    LocationName,
    Street,
    City,
    ZipCode,
    Latitude,
    Longitude,
    MaxPower,
    PlugTypes,
    ChargePointsAc,
    ChargePointsDc,
    ContactName,
    ContactPhone,
    ChargePointCount,
    RawData,
    CreatedAt,
    UpdatedAt,
}
