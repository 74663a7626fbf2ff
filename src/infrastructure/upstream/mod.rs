//! HTTP client for the upstream map/pricing API
//!
//! Implements the outbound `UpstreamApi` port. All payload normalization
//! lives here; the cache core only ever sees the normalized field sets
//! plus the raw snapshot it stores for reference.

use async_trait::async_trait;
use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT};
use serde_json::{json, Value};

use crate::application::ports::UpstreamApi;
use crate::domain::price::PriceFields;
use crate::domain::station::{PowerType, StationFields};
use crate::domain::{CacheError, CacheResult};

pub const DEFAULT_BASE_URL: &str = "https://chargemyhyundai.com/api/map/v1";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

fn upstream_err(e: reqwest::Error) -> CacheError {
    CacheError::Upstream(e.to_string())
}

/// reqwest-backed upstream client.
pub struct HttpUpstreamApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUpstreamApi {
    pub fn new(base_url: impl Into<String>) -> CacheResult<Self> {
        // The map API rejects requests without browser-looking headers
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ORIGIN,
            HeaderValue::from_static("https://chargemyhyundai.com"),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://chargemyhyundai.com/web/de/hyundai-de/map"),
        );
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(upstream_err)?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl UpstreamApi for HttpUpstreamApi {
    async fn fetch_pool_details(&self, pool_id: &str, market: &str) -> CacheResult<StationFields> {
        let url = format!("{}/{}/query", self.base_url, market);
        let response = self
            .client
            .post(&url)
            .header("rest-api-path", "pools")
            .json(&json!({ "dcsPoolIds": [pool_id] }))
            .send()
            .await
            .map_err(upstream_err)?;
        if !response.status().is_success() {
            warn!("Pool details API returned {}", response.status());
            return Err(CacheError::Upstream(format!(
                "pool details returned {}",
                response.status()
            )));
        }
        let payload: Value = response.json().await.map_err(upstream_err)?;
        let pool = payload
            .as_array()
            .and_then(|pools| pools.first())
            .ok_or_else(|| CacheError::Upstream(format!("empty pool response for {}", pool_id)))?;
        Ok(normalize_pool(pool))
    }

    async fn fetch_price(
        &self,
        charge_point_id: &str,
        tariff_id: &str,
        power_type: PowerType,
        power_kw: i32,
        market: &str,
    ) -> CacheResult<PriceFields> {
        let url = format!("{}/{}/tariffs/{}/prices", self.base_url, market, tariff_id);
        let body = json!([{
            "charge_point": charge_point_id,
            "power_type": power_type.as_str(),
            "power": power_kw,
        }]);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(upstream_err)?;
        if !response.status().is_success() {
            warn!("Price API returned {}", response.status());
            return Err(CacheError::Upstream(format!(
                "price quote returned {}",
                response.status()
            )));
        }
        let payload: Value = response.json().await.map_err(upstream_err)?;
        let item = payload.as_array().and_then(|items| items.first()).ok_or_else(|| {
            CacheError::Upstream(format!("empty price response for {}", charge_point_id))
        })?;
        Ok(normalize_price(item))
    }
}

/// Classify a connector as AC or DC from its plug type, falling back to
/// the upstream phase type.
fn classify_connector(plug_type: &str, phase_type: Option<&str>) -> PowerType {
    let plug = plug_type.to_ascii_uppercase();
    if plug.contains("TYP2") || plug.contains("TYPE2") {
        PowerType::Ac
    } else if plug.contains("CCS") || plug.contains("COMBO") {
        PowerType::Dc
    } else if phase_type == Some("DC") {
        PowerType::Dc
    } else {
        PowerType::Ac
    }
}

/// Normalize one pool from the pools query response.
pub fn normalize_pool(pool: &Value) -> StationFields {
    let operator_name = pool
        .get("technicalChargePointOperatorName")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut location_name = None;
    let mut street = None;
    let mut city = None;
    let mut zip_code = None;
    if let Some(location) = pool
        .get("poolLocations")
        .and_then(Value::as_array)
        .and_then(|locations| locations.first())
    {
        street = location.get("street").and_then(Value::as_str).map(str::to_string);
        city = location.get("city").and_then(Value::as_str).map(str::to_string);
        zip_code = location
            .get("zipCode")
            .and_then(Value::as_str)
            .map(str::to_string);
        location_name = location
            .get("poolLocationNames")
            .and_then(Value::as_array)
            .and_then(|names| names.first())
            .and_then(|name| name.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    let mut max_power: i64 = 0;
    let mut plug_types: Vec<String> = Vec::new();
    let mut charge_points_ac: Vec<String> = Vec::new();
    let mut charge_points_dc: Vec<String> = Vec::new();

    let stations = pool
        .get("chargingStations")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for station in &stations {
        let charge_points = station
            .get("chargePoints")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for charge_point in &charge_points {
            let Some(cp_id) = charge_point.get("dcsCpId").and_then(Value::as_str) else {
                continue;
            };
            let connectors = charge_point
                .get("connectors")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            for connector in &connectors {
                let power_level = connector
                    .get("powerLevel")
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                if power_level > max_power {
                    max_power = power_level;
                }
                let plug_type = connector
                    .get("plugType")
                    .and_then(Value::as_str)
                    .unwrap_or("");
                if !plug_type.is_empty() && !plug_types.iter().any(|p| p == plug_type) {
                    plug_types.push(plug_type.to_string());
                }
                let phase_type = connector.get("phaseType").and_then(Value::as_str);
                let list = match classify_connector(plug_type, phase_type) {
                    PowerType::Ac => &mut charge_points_ac,
                    PowerType::Dc => &mut charge_points_dc,
                };
                if !list.iter().any(|id| id == cp_id) {
                    list.push(cp_id.to_string());
                }
            }
        }
    }

    StationFields {
        operator_name,
        location_name,
        street,
        city,
        zip_code,
        max_power: Some(max_power as i32),
        plug_types,
        charge_points_ac,
        charge_points_dc,
        contact_name: None,
        contact_phone: None,
        raw: pool.clone(),
    }
}

/// Normalize one quote from the tariff prices response. Price components
/// map as ENERGY -> energy price, FLAT -> session fee, TIME -> blocking
/// fee with the element's minimum duration as the grace period.
pub fn normalize_price(item: &Value) -> PriceFields {
    let currency = item
        .get("currency")
        .and_then(Value::as_str)
        .unwrap_or("EUR")
        .to_string();

    let mut energy_price = None;
    let mut session_fee = None;
    let mut blocking_fee = None;
    let mut blocking_after_minutes = None;

    let elements = item
        .get("elements")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for element in &elements {
        let components = element
            .get("price_components")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        for component in &components {
            let price = component.get("price").and_then(Value::as_f64);
            match component.get("type").and_then(Value::as_str) {
                Some("ENERGY") => energy_price = price,
                Some("FLAT") => session_fee = price,
                Some("TIME") => {
                    blocking_fee = price;
                    let min_duration = element
                        .get("restrictions")
                        .and_then(|r| r.get("min_duration"))
                        .and_then(Value::as_i64)
                        .unwrap_or(0);
                    if min_duration > 0 {
                        blocking_after_minutes = Some((min_duration / 60) as i32);
                    }
                }
                _ => {}
            }
        }
    }

    PriceFields {
        currency,
        energy_price,
        session_fee,
        blocking_fee,
        blocking_after_minutes,
        raw: item.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_pool_extracts_location_and_partitions_charge_points() {
        let pool = json!({
            "technicalChargePointOperatorName": "EnBW mobility+",
            "poolLocations": [{
                "street": "Hauptstr. 1",
                "city": "Berlin",
                "zipCode": "10115",
                "poolLocationNames": [{"name": "Parkhaus Mitte"}]
            }],
            "chargingStations": [{
                "chargePoints": [
                    {
                        "dcsCpId": "CP1",
                        "connectors": [
                            {"plugType": "Typ2", "powerLevel": 22, "phaseType": "AC"}
                        ]
                    },
                    {
                        "dcsCpId": "CP2",
                        "connectors": [
                            {"plugType": "CCS Combo 2", "powerLevel": 150, "phaseType": "DC"},
                            // Second connector on the same charge point
                            // must not duplicate the id
                            {"plugType": "CCS Combo 2", "powerLevel": 150, "phaseType": "DC"}
                        ]
                    }
                ]
            }]
        });

        let fields = normalize_pool(&pool);
        assert_eq!(fields.operator_name.as_deref(), Some("EnBW mobility+"));
        assert_eq!(fields.location_name.as_deref(), Some("Parkhaus Mitte"));
        assert_eq!(fields.street.as_deref(), Some("Hauptstr. 1"));
        assert_eq!(fields.city.as_deref(), Some("Berlin"));
        assert_eq!(fields.zip_code.as_deref(), Some("10115"));
        assert_eq!(fields.max_power, Some(150));
        assert_eq!(fields.plug_types, vec!["Typ2", "CCS Combo 2"]);
        assert_eq!(fields.charge_points_ac, vec!["CP1"]);
        assert_eq!(fields.charge_points_dc, vec!["CP2"]);
    }

    #[test]
    fn classify_falls_back_to_phase_type_for_unknown_plugs() {
        assert_eq!(classify_connector("Typ2", None), PowerType::Ac);
        assert_eq!(classify_connector("TYPE2", None), PowerType::Ac);
        assert_eq!(classify_connector("CCS", None), PowerType::Dc);
        assert_eq!(classify_connector("Combo 2", Some("AC")), PowerType::Dc);
        assert_eq!(classify_connector("CHAdeMO", Some("DC")), PowerType::Dc);
        assert_eq!(classify_connector("", None), PowerType::Ac);
    }

    #[test]
    fn normalize_price_maps_components_and_grace_period() {
        let item = json!({
            "currency": "EUR",
            "elements": [
                {
                    "price_components": [
                        {"type": "ENERGY", "price": 0.49},
                        {"type": "FLAT", "price": 0.99}
                    ]
                },
                {
                    "price_components": [{"type": "TIME", "price": 0.10}],
                    "restrictions": {"min_duration": 14400}
                }
            ]
        });

        let fields = normalize_price(&item);
        assert_eq!(fields.currency, "EUR");
        assert_eq!(fields.energy_price, Some(0.49));
        assert_eq!(fields.session_fee, Some(0.99));
        assert_eq!(fields.blocking_fee, Some(0.10));
        assert_eq!(fields.blocking_after_minutes, Some(240));
    }

    #[test]
    fn normalize_price_defaults_when_payload_is_sparse() {
        let fields = normalize_price(&json!({}));
        assert_eq!(fields.currency, "EUR");
        assert_eq!(fields.energy_price, None);
        assert_eq!(fields.session_fee, None);
        assert_eq!(fields.blocking_fee, None);
        assert_eq!(fields.blocking_after_minutes, None);
    }
}
