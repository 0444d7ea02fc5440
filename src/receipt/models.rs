use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::receipt_urls;
use crate::shop::models::CountryCode;
use crate::utils::hash::make_hash;

/// Resolution state of a purchase line against the shop catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemBarcodeStatus {
    #[default]
    Pending,
    Resolved,
    NotFound,
}

impl ItemBarcodeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::NotFound => "not_found",
        }
    }
}

impl std::str::FromStr for ItemBarcodeStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "resolved" => Ok(Self::Resolved),
            "not_found" => Ok(Self::NotFound),
            other => Err(format!("unknown barcode status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityUnit {
    Kg,
    G,
    L,
    Ml,
    Piece,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchasedItem {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<QuantityUnit>,
    pub unit_quantity: Option<f64>,
    pub price: f64,
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub status: ItemBarcodeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub id: String,
    pub date: DateTime<Utc>,
    pub user_id: Uuid,
    pub company_id: String,
    pub company_name: String,
    pub shop_address: String,
    pub country_code: CountryCode,
    pub cash_register_id: String,
    pub key: i64,
    pub currency_code: String,
    pub total_amount: f64,
    pub shop_id: Option<i32>,
    pub receipt_url: String,
    pub receipt_canonical_url: Option<String>,
    pub purchases: Vec<PurchasedItem>,
}

/// Natural key of a fiscal receipt: issuing country, cash register, receipt
/// number. Used when a payload arrives without an id, so resubmitting the
/// same receipt hits the same row.
pub fn derive_receipt_id(country_code: CountryCode, cash_register_id: &str, key: i64) -> String {
    format!("{}_{}_{}", country_code.as_str(), cash_register_id, key)
}

#[derive(Debug, Deserialize)]
pub struct ReceiptPayload {
    pub id: Option<String>,
    pub date: DateTime<Utc>,
    pub user_id: Uuid,
    pub company_id: String,
    pub company_name: String,
    pub shop_address: String,
    #[serde(default)]
    pub country_code: CountryCode,
    pub cash_register_id: String,
    pub key: i64,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    pub total_amount: f64,
    pub shop_id: Option<i32>,
    pub receipt_url: String,
    pub receipt_canonical_url: Option<String>,
    #[serde(default)]
    pub purchases: Vec<PurchasedItem>,
}

fn default_currency() -> String {
    "mdl".to_owned()
}

impl From<ReceiptPayload> for Receipt {
    fn from(payload: ReceiptPayload) -> Self {
        let id = payload.id.unwrap_or_else(|| {
            derive_receipt_id(payload.country_code, &payload.cash_register_id, payload.key)
        });

        Receipt {
            id,
            date: payload.date,
            user_id: payload.user_id,
            company_id: payload.company_id,
            company_name: payload.company_name,
            shop_address: payload.shop_address,
            country_code: payload.country_code,
            cash_register_id: payload.cash_register_id,
            key: payload.key,
            currency_code: payload.currency_code,
            total_amount: payload.total_amount,
            shop_id: payload.shop_id,
            receipt_url: payload.receipt_url,
            receipt_canonical_url: payload.receipt_canonical_url,
            purchases: payload.purchases,
        }
    }
}

/// Mapping from a url to the receipt it resolves to. The id is the url's
/// hash, so lookup is a single point read.
#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = receipt_urls)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReceiptUrl {
    pub id: String,
    pub url: String,
    pub receipt_id: String,
}

impl ReceiptUrl {
    pub fn new(url: &str, receipt_id: &str) -> Self {
        Self {
            id: make_hash(url),
            url: url.to_owned(),
            receipt_id: receipt_id.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = receipt_urls)]
pub struct ReceiptUrlPatch {
    pub receipt_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GetReceiptByIdQuery {
    pub receipt_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GetReceiptByUrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AddShopRequest {
    pub shop_id: i32,
    pub receipt: ReceiptPayload,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_payload() -> ReceiptPayload {
        ReceiptPayload {
            id: None,
            date: Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap(),
            user_id: Uuid::new_v4(),
            company_id: "cmp_1".to_owned(),
            company_name: "Test Co".to_owned(),
            shop_address: "123 Test Street".to_owned(),
            country_code: CountryCode::Moldova,
            cash_register_id: "cr_1".to_owned(),
            key: 42,
            currency_code: "mdl".to_owned(),
            total_amount: 12.34,
            shop_id: None,
            receipt_url: "https://example.com/receipt/42".to_owned(),
            receipt_canonical_url: None,
            purchases: Vec::new(),
        }
    }

    #[test]
    fn derives_natural_receipt_id() {
        assert_eq!(
            derive_receipt_id(CountryCode::Moldova, "cr_1", 42),
            "md_cr_1_42"
        );
    }

    #[test]
    fn payload_without_id_gets_the_derived_one() {
        let receipt = Receipt::from(sample_payload());

        assert_eq!(receipt.id, "md_cr_1_42");
    }

    #[test]
    fn caller_assigned_id_is_kept() {
        let mut payload = sample_payload();
        payload.id = Some("custom-id".to_owned());

        let receipt = Receipt::from(payload);

        assert_eq!(receipt.id, "custom-id");
    }

    #[test]
    fn purchase_status_defaults_to_pending_on_the_wire() {
        let item: PurchasedItem = serde_json::from_value(serde_json::json!({
            "name": "Item A",
            "quantity": 2.0,
            "unit": "piece",
            "price": 6.17
        }))
        .unwrap();

        assert_eq!(item.status, ItemBarcodeStatus::Pending);
        assert_eq!(item.item_id, None);
        assert_eq!(item.unit, Some(QuantityUnit::Piece));
    }

    #[test]
    fn receipt_url_id_is_the_url_hash() {
        let url = "https://example.com/receipt/42";
        let mapping = ReceiptUrl::new(url, "md_cr_1_42");

        assert_eq!(mapping.id, make_hash(url));
        assert_eq!(mapping.receipt_id, "md_cr_1_42");
    }
}
