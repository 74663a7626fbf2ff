//! SeaORM implementation of StationRepository

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::domain::station::{
    BoundingBox, Coordinates, StationFields, StationRecord, StationRepository,
};
use crate::domain::CacheResult;
use crate::infrastructure::database::entities::station;

fn model_to_record(m: station::Model) -> CacheResult<StationRecord> {
    let coordinates = match (m.latitude, m.longitude) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };
    Ok(StationRecord {
        pool_id: m.pool_id,
        market: m.market,
        operator_id: m.operator_id,
        operator_name: m.operator_name,
        location_name: m.location_name,
        street: m.street,
        city: m.city,
        zip_code: m.zip_code,
        coordinates,
        max_power: m.max_power,
        plug_types: serde_json::from_str(&m.plug_types)?,
        charge_points_ac: serde_json::from_str(&m.charge_points_ac)?,
        charge_points_dc: serde_json::from_str(&m.charge_points_dc)?,
        contact_name: m.contact_name,
        contact_phone: m.contact_phone,
        charge_point_count: m.charge_point_count,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub struct SeaOrmStationRepository {
    db: DatabaseConnection,
}

impl SeaOrmStationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Base query for map reads: only rows with known coordinates.
    fn with_coordinates() -> sea_orm::Select<station::Entity> {
        station::Entity::find()
            .filter(station::Column::Latitude.is_not_null())
            .filter(station::Column::Longitude.is_not_null())
    }
}

#[async_trait]
impl StationRepository for SeaOrmStationRepository {
    async fn get(&self, pool_id: &str) -> CacheResult<Option<StationRecord>> {
        let model = station::Entity::find_by_id(pool_id).one(&self.db).await?;
        model.map(model_to_record).transpose()
    }

    async fn get_many(
        &self,
        pool_ids: &[String],
    ) -> CacheResult<HashMap<String, StationRecord>> {
        if pool_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let models = station::Entity::find()
            .filter(station::Column::PoolId.is_in(pool_ids.to_vec()))
            .all(&self.db)
            .await?;
        let mut result = HashMap::with_capacity(models.len());
        for m in models {
            let record = model_to_record(m)?;
            result.insert(record.pool_id.clone(), record);
        }
        Ok(result)
    }

    async fn get_in_bounds(
        &self,
        bounds: BoundingBox,
        market: Option<&str>,
    ) -> CacheResult<Vec<StationRecord>> {
        let mut query = Self::with_coordinates()
            .filter(station::Column::Latitude.lte(bounds.lat_nw))
            .filter(station::Column::Latitude.gte(bounds.lat_se))
            .filter(station::Column::Longitude.gte(bounds.lng_nw))
            .filter(station::Column::Longitude.lte(bounds.lng_se));
        if let Some(market) = market {
            query = query.filter(station::Column::Market.eq(market));
        }
        let models = query.all(&self.db).await?;
        models.into_iter().map(model_to_record).collect()
    }

    async fn get_all(&self, market: Option<&str>) -> CacheResult<Vec<StationRecord>> {
        let mut query = Self::with_coordinates();
        if let Some(market) = market {
            query = query.filter(station::Column::Market.eq(market));
        }
        let models = query.all(&self.db).await?;
        models.into_iter().map(model_to_record).collect()
    }

    async fn save(
        &self,
        pool_id: &str,
        market: &str,
        fields: StationFields,
        coordinates: Option<Coordinates>,
        charge_point_count: Option<i32>,
        operator_id: Option<&str>,
    ) -> CacheResult<()> {
        let now = Utc::now();
        let plug_types = serde_json::to_string(&fields.plug_types)?;
        let charge_points_ac = serde_json::to_string(&fields.charge_points_ac)?;
        let charge_points_dc = serde_json::to_string(&fields.charge_points_dc)?;
        let raw_data = serde_json::to_string(&fields.raw)?;

        let txn = self.db.begin().await?;
        let existing = station::Entity::find_by_id(pool_id).one(&txn).await?;
        match existing {
            Some(row) => {
                let mut model: station::ActiveModel = row.into();
                // operator_id is kept from the first insert
                model.market = Set(market.to_string());
                model.operator_name = Set(fields.operator_name);
                model.location_name = Set(fields.location_name);
                model.street = Set(fields.street);
                model.city = Set(fields.city);
                model.zip_code = Set(fields.zip_code);
                model.max_power = Set(fields.max_power);
                model.plug_types = Set(plug_types);
                model.charge_points_ac = Set(charge_points_ac);
                model.charge_points_dc = Set(charge_points_dc);
                model.contact_name = Set(fields.contact_name);
                model.contact_phone = Set(fields.contact_phone);
                model.raw_data = Set(raw_data);
                // A refresh that observed no coordinates or count keeps
                // the stored values
                if let Some(c) = coordinates {
                    model.latitude = Set(Some(c.latitude));
                    model.longitude = Set(Some(c.longitude));
                }
                if charge_point_count.is_some() {
                    model.charge_point_count = Set(charge_point_count);
                }
                model.updated_at = Set(now);
                model.update(&txn).await?;
            }
            None => {
                let model = station::ActiveModel {
                    pool_id: Set(pool_id.to_string()),
                    market: Set(market.to_string()),
                    operator_id: Set(operator_id.map(str::to_string)),
                    operator_name: Set(fields.operator_name),
                    location_name: Set(fields.location_name),
                    street: Set(fields.street),
                    city: Set(fields.city),
                    zip_code: Set(fields.zip_code),
                    latitude: Set(coordinates.map(|c| c.latitude)),
                    longitude: Set(coordinates.map(|c| c.longitude)),
                    max_power: Set(fields.max_power),
                    plug_types: Set(plug_types),
                    charge_points_ac: Set(charge_points_ac),
                    charge_points_dc: Set(charge_points_dc),
                    contact_name: Set(fields.contact_name),
                    contact_phone: Set(fields.contact_phone),
                    charge_point_count: Set(charge_point_count),
                    raw_data: Set(raw_data),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                model.insert(&txn).await?;
            }
        }
        txn.commit().await?;
        debug!("Station saved: {} ({})", pool_id, market);
        Ok(())
    }

    async fn is_stale(&self, pool_id: &str, max_age_hours: i64) -> CacheResult<bool> {
        let model = station::Entity::find_by_id(pool_id).one(&self.db).await?;
        let Some(model) = model else {
            return Ok(true);
        };
        let age = Utc::now() - model.updated_at;
        Ok(age > Duration::hours(max_age_hours))
    }

    async fn stale_ids(
        &self,
        market: Option<&str>,
        max_age_hours: i64,
        limit: u64,
    ) -> CacheResult<Vec<String>> {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let mut query = station::Entity::find()
            .filter(station::Column::UpdatedAt.lt(cutoff))
            .order_by_asc(station::Column::UpdatedAt)
            .limit(limit);
        if let Some(market) = market {
            query = query.filter(station::Column::Market.eq(market));
        }
        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(|m| m.pool_id).collect())
    }

    async fn count(&self) -> CacheResult<u64> {
        Ok(station::Entity::find().count(&self.db).await?)
    }

    async fn count_fresh(&self, max_age_hours: i64) -> CacheResult<u64> {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        Ok(station::Entity::find()
            .filter(station::Column::UpdatedAt.gte(cutoff))
            .count(&self.db)
            .await?)
    }
}
