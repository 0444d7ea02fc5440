use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::models::{PurchasedItem, Receipt, ReceiptUrl, ReceiptUrlPatch};
use crate::schema::{receipt_urls, receipts};
use crate::shop::models::CountryCode;
use crate::store::{StoreError, Table, connection_error, decode_error};
use crate::utils::types::Pool;

#[derive(Debug, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = receipts)]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ReceiptRow {
    id: String,
    date: DateTime<Utc>,
    user_id: Uuid,
    company_id: String,
    company_name: String,
    shop_address: String,
    country_code: String,
    cash_register_id: String,
    key: i64,
    currency_code: String,
    total_amount: f64,
    shop_id: Option<i32>,
    receipt_url: String,
    receipt_canonical_url: Option<String>,
    purchases: serde_json::Value,
}

impl ReceiptRow {
    fn from_receipt(receipt: &Receipt) -> Result<Self, StoreError> {
        let purchases =
            serde_json::to_value(&receipt.purchases).map_err(|e| decode_error("receipts", e))?;

        Ok(Self {
            id: receipt.id.clone(),
            date: receipt.date,
            user_id: receipt.user_id,
            company_id: receipt.company_id.clone(),
            company_name: receipt.company_name.clone(),
            shop_address: receipt.shop_address.clone(),
            country_code: receipt.country_code.as_str().to_owned(),
            cash_register_id: receipt.cash_register_id.clone(),
            key: receipt.key,
            currency_code: receipt.currency_code.clone(),
            total_amount: receipt.total_amount,
            shop_id: receipt.shop_id,
            receipt_url: receipt.receipt_url.clone(),
            receipt_canonical_url: receipt.receipt_canonical_url.clone(),
            purchases,
        })
    }

    fn into_receipt(self) -> Result<Receipt, StoreError> {
        let country_code =
            CountryCode::from_str(&self.country_code).map_err(|e| decode_error("receipts", e))?;
        let purchases: Vec<PurchasedItem> =
            serde_json::from_value(self.purchases).map_err(|e| decode_error("receipts", e))?;

        Ok(Receipt {
            id: self.id,
            date: self.date,
            user_id: self.user_id,
            company_id: self.company_id,
            company_name: self.company_name,
            shop_address: self.shop_address,
            country_code,
            cash_register_id: self.cash_register_id,
            key: self.key,
            currency_code: self.currency_code,
            total_amount: self.total_amount,
            shop_id: self.shop_id,
            receipt_url: self.receipt_url,
            receipt_canonical_url: self.receipt_canonical_url,
            purchases,
        })
    }
}

pub struct PgReceipts {
    pool: Pool,
}

impl PgReceipts {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Table for PgReceipts {
    type Id = String;
    type Record = Receipt;
    type NewRecord = Receipt;
    type Patch = Receipt;
    type Filter = ();

    async fn read_one(&self, id: &String) -> Result<Option<Receipt>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let row: Option<ReceiptRow> = receipts::table
            .find(id.clone())
            .select(ReceiptRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        row.map(ReceiptRow::into_receipt).transpose()
    }

    async fn read_many(&self, _filter: &(), limit: i64) -> Result<Vec<Receipt>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let rows: Vec<ReceiptRow> = receipts::table
            .limit(limit)
            .select(ReceiptRow::as_select())
            .load(&mut conn)
            .await?;

        rows.into_iter().map(ReceiptRow::into_receipt).collect()
    }

    async fn create_one(&self, record: Receipt) -> Result<String, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let id = diesel::insert_into(receipts::table)
            .values(ReceiptRow::from_receipt(&record)?)
            .returning(receipts::id)
            .get_result(&mut conn)
            .await?;

        Ok(id)
    }

    async fn update_one(&self, id: &String, patch: Receipt) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(receipts::table.find(id.clone()))
            .set(ReceiptRow::from_receipt(&patch)?)
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn update_one_by(&self, _filter: &(), patch: Receipt) -> Result<bool, StoreError> {
        // an empty filter matches every row; update by the patch's own id instead
        let id = patch.id.clone();
        self.update_one(&id, patch).await
    }

    async fn create_or_update_one(&self, record: Receipt) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let row = ReceiptRow::from_receipt(&record)?;
        diesel::insert_into(receipts::table)
            .values(&row)
            .on_conflict(receipts::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

pub struct PgReceiptUrls {
    pool: Pool,
}

impl PgReceiptUrls {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Table for PgReceiptUrls {
    type Id = String;
    type Record = ReceiptUrl;
    type NewRecord = ReceiptUrl;
    type Patch = ReceiptUrlPatch;
    type Filter = ();

    async fn read_one(&self, id: &String) -> Result<Option<ReceiptUrl>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let mapping = receipt_urls::table
            .filter(receipt_urls::id.eq(id.clone()))
            .select(ReceiptUrl::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(mapping)
    }

    async fn read_many(&self, _filter: &(), limit: i64) -> Result<Vec<ReceiptUrl>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let res = receipt_urls::table
            .limit(limit)
            .select(ReceiptUrl::as_select())
            .load(&mut conn)
            .await?;

        Ok(res)
    }

    async fn create_one(&self, record: ReceiptUrl) -> Result<String, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let id = diesel::insert_into(receipt_urls::table)
            .values(&record)
            .returning(receipt_urls::id)
            .get_result(&mut conn)
            .await?;

        Ok(id)
    }

    async fn update_one(&self, id: &String, patch: ReceiptUrlPatch) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(receipt_urls::table.filter(receipt_urls::id.eq(id.clone())))
            .set(&patch)
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn update_one_by(&self, _filter: &(), patch: ReceiptUrlPatch) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(receipt_urls::table)
            .set(&patch)
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn create_or_update_one(&self, record: ReceiptUrl) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        // url mappings carry no unique key; an upsert degenerates to an append
        diesel::insert_into(receipt_urls::table)
            .values(&record)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}
