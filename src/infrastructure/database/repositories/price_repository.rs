//! SeaORM implementation of PriceRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    Set, TransactionTrait,
};

use crate::domain::price::{PriceFields, PriceRecord, PriceRepository};
use crate::domain::station::PowerType;
use crate::domain::{CacheError, CacheResult};
use crate::infrastructure::database::entities::price;

fn model_to_record(m: price::Model) -> CacheResult<PriceRecord> {
    let power_type = PowerType::parse(&m.power_type).ok_or_else(|| {
        CacheError::Upstream(format!("unknown power type in cache: {}", m.power_type))
    })?;
    Ok(PriceRecord {
        pool_id: m.pool_id,
        charge_point_id: m.charge_point_id,
        tariff_id: m.tariff_id,
        power_type,
        power_kw: m.power,
        market: m.market,
        currency: m.currency,
        energy_price: m.energy_price,
        session_fee: m.session_fee,
        blocking_fee: m.blocking_fee,
        blocking_after_minutes: m.blocking_after_minutes,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub struct SeaOrmPriceRepository {
    db: DatabaseConnection,
}

impl SeaOrmPriceRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PriceRepository for SeaOrmPriceRepository {
    async fn get(
        &self,
        pool_id: &str,
        tariff_id: &str,
        power_type: PowerType,
        market: &str,
    ) -> CacheResult<Option<PriceRecord>> {
        let model = price::Entity::find()
            .filter(price::Column::PoolId.eq(pool_id))
            .filter(price::Column::TariffId.eq(tariff_id))
            .filter(price::Column::PowerType.eq(power_type.as_str()))
            .filter(price::Column::Market.eq(market))
            .one(&self.db)
            .await?;
        model.map(model_to_record).transpose()
    }

    async fn get_many(
        &self,
        pool_ids: &[String],
        tariff_id: &str,
        power_type: PowerType,
        market: &str,
    ) -> CacheResult<HashMap<String, PriceRecord>> {
        if pool_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = price::Entity::find()
            .filter(price::Column::PoolId.is_in(pool_ids.to_vec()))
            .filter(price::Column::TariffId.eq(tariff_id))
            .filter(price::Column::PowerType.eq(power_type.as_str()))
            .filter(price::Column::Market.eq(market))
            .all(&self.db)
            .await?;
        let mut result = HashMap::with_capacity(models.len());
        for m in models {
            let record = model_to_record(m)?;
            result.insert(record.pool_id.clone(), record);
        }
        Ok(result)
    }

    async fn get_all_for_pools(
        &self,
        pool_ids: &[String],
        market: &str,
    ) -> CacheResult<HashMap<String, HashMap<String, PriceRecord>>> {
        if pool_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = price::Entity::find()
            .filter(price::Column::PoolId.is_in(pool_ids.to_vec()))
            .filter(price::Column::Market.eq(market))
            .all(&self.db)
            .await?;
        let mut result: HashMap<String, HashMap<String, PriceRecord>> = HashMap::new();
        for m in models {
            let record = model_to_record(m)?;
            result
                .entry(record.pool_id.clone())
                .or_default()
                .insert(record.tariff_key(), record);
        }
        Ok(result)
    }

    async fn save(
        &self,
        pool_id: &str,
        charge_point_id: &str,
        tariff_id: &str,
        power_type: PowerType,
        power_kw: i32,
        market: &str,
        fields: PriceFields,
    ) -> CacheResult<()> {
        let now = Utc::now();
        let raw_data = serde_json::to_string(&fields.raw)?;

        let txn = self.db.begin().await?;
        let existing = price::Entity::find()
            .filter(price::Column::PoolId.eq(pool_id))
            .filter(price::Column::TariffId.eq(tariff_id))
            .filter(price::Column::PowerType.eq(power_type.as_str()))
            .filter(price::Column::Market.eq(market))
            .one(&txn)
            .await?;
        match existing {
            Some(row) => {
                // Same quote key: fully replace the price fields
                let mut model: price::ActiveModel = row.into();
                model.charge_point_id = Set(charge_point_id.to_string());
                model.power = Set(power_kw);
                model.currency = Set(fields.currency);
                model.energy_price = Set(fields.energy_price);
                model.session_fee = Set(fields.session_fee);
                model.blocking_fee = Set(fields.blocking_fee);
                model.blocking_after_minutes = Set(fields.blocking_after_minutes);
                model.raw_data = Set(raw_data);
                model.updated_at = Set(now);
                model.update(&txn).await?;
            }
            None => {
                let model = price::ActiveModel {
                    id: sea_orm::ActiveValue::NotSet,
                    pool_id: Set(pool_id.to_string()),
                    charge_point_id: Set(charge_point_id.to_string()),
                    tariff_id: Set(tariff_id.to_string()),
                    power_type: Set(power_type.as_str().to_string()),
                    power: Set(power_kw),
                    market: Set(market.to_string()),
                    currency: Set(fields.currency),
                    energy_price: Set(fields.energy_price),
                    session_fee: Set(fields.session_fee),
                    blocking_fee: Set(fields.blocking_fee),
                    blocking_after_minutes: Set(fields.blocking_after_minutes),
                    raw_data: Set(raw_data),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&txn).await?;
            }
        }
        txn.commit().await?;
        debug!(
            "Price saved: {} {} {} {}",
            pool_id,
            tariff_id,
            power_type,
            market
        );
        Ok(())
    }

    async fn count(&self) -> CacheResult<u64> {
        Ok(price::Entity::find().count(&self.db).await?)
    }
}
