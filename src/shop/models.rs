use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::receipt::models::ItemBarcodeStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CountryCode {
    #[default]
    #[serde(rename = "md")]
    Moldova,
}

impl CountryCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Moldova => "md",
        }
    }
}

impl std::str::FromStr for CountryCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "md" => Ok(Self::Moldova),
            other => Err(format!("unknown country code: {other}")),
        }
    }
}

impl std::fmt::Display for CountryCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl OsmType {
    /// Numeric code used inside derived shop identifiers. The mapping is
    /// fixed wire data: NODE=1, RELATION=2, WAY=3.
    pub fn code(self) -> u8 {
        match self {
            Self::Node => 1,
            Self::Relation => 2,
            Self::Way => 3,
        }
    }
}

/// Geolocation record a shop was created from, as returned by the geocoder.
/// Coordinates stay strings; nothing in the backend does arithmetic on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsmData {
    #[serde(rename = "type")]
    pub osm_type: OsmType,
    pub key: i64,
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

/// Canonical external identifier of a shop: `"{type_code}:{key}"`.
pub fn derive_osm_id(osm_type: OsmType, key: i64) -> String {
    format!("{}:{}", osm_type.code(), key)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shop {
    pub id: Option<i32>,
    pub osm_id: String,
    pub country_code: Option<CountryCode>,
    pub company_id: Option<String>,
    pub address: Option<String>,
    pub osm_data: Option<OsmData>,
    pub creator_user_id: Uuid,
    pub creation_time: i64,
}

/// Wire shape of a shop. A supplied `osm_id` is taken as-is and never
/// recomputed; otherwise it is derived from the OSM record once, here.
#[derive(Debug, Deserialize)]
pub struct ShopPayload {
    pub id: Option<i32>,
    pub osm_id: Option<String>,
    pub country_code: Option<CountryCode>,
    pub company_id: Option<String>,
    pub address: Option<String>,
    pub osm_data: Option<OsmData>,
    pub creator_user_id: Uuid,
    pub creation_time: Option<i64>,
}

impl TryFrom<ShopPayload> for Shop {
    type Error = String;

    fn try_from(payload: ShopPayload) -> Result<Self, Self::Error> {
        let osm_id = match (payload.osm_id, payload.osm_data.as_ref()) {
            (Some(osm_id), _) => osm_id,
            (None, Some(osm_data)) => derive_osm_id(osm_data.osm_type, osm_data.key),
            (None, None) => return Err("either osm_id or osm_data is required".to_owned()),
        };

        Ok(Shop {
            id: payload.id,
            osm_id,
            country_code: payload.country_code,
            company_id: payload.company_id,
            address: payload.address,
            osm_data: payload.osm_data,
            creator_user_id: payload.creator_user_id,
            creation_time: payload
                .creation_time
                .unwrap_or_else(|| Utc::now().timestamp()),
        })
    }
}

#[derive(Debug, Clone)]
pub enum ShopFilter {
    OsmId(String),
    /// The receipt-side lookup: where the purchase happened.
    Source {
        address: String,
        company_id: String,
        country_code: CountryCode,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ShopPatch {
    pub country_code: Option<CountryCode>,
    pub company_id: Option<String>,
    pub address: Option<String>,
    pub osm_data: Option<OsmData>,
}

/// Catalog item sold by a shop, matched against receipt purchase lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: Uuid,
    pub shop_id: i32,
    pub name: String,
    pub barcode: Option<String>,
    pub status: Option<ItemBarcodeStatus>,
}

#[derive(Debug, Clone)]
pub struct ShopItemFilter {
    pub name: String,
    pub shop_id: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ShopItemPatch {
    pub barcode: Option<String>,
    pub status: Option<ItemBarcodeStatus>,
}
