use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::models::{
    CountryCode, OsmData, Shop, ShopFilter, ShopItem, ShopItemFilter, ShopItemPatch, ShopPatch,
};
use crate::receipt::models::ItemBarcodeStatus;
use crate::schema::{shop_items, shops};
use crate::store::{StoreError, Table, connection_error, decode_error};
use crate::utils::types::Pool;

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = shops)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ShopRow {
    id: i32,
    osm_id: String,
    country_code: Option<String>,
    company_id: Option<String>,
    address: Option<String>,
    osm_data: Option<serde_json::Value>,
    creator_user_id: Uuid,
    creation_time: i64,
}

impl ShopRow {
    fn into_shop(self) -> Result<Shop, StoreError> {
        let country_code = self
            .country_code
            .as_deref()
            .map(CountryCode::from_str)
            .transpose()
            .map_err(|e| decode_error("shops", e))?;

        let osm_data = self
            .osm_data
            .map(serde_json::from_value::<OsmData>)
            .transpose()
            .map_err(|e| decode_error("shops", e))?;

        Ok(Shop {
            id: Some(self.id),
            osm_id: self.osm_id,
            country_code,
            company_id: self.company_id,
            address: self.address,
            osm_data,
            creator_user_id: self.creator_user_id,
            creation_time: self.creation_time,
        })
    }
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = shops)]
struct NewShopRow {
    id: Option<i32>,
    osm_id: String,
    country_code: Option<String>,
    company_id: Option<String>,
    address: Option<String>,
    osm_data: Option<serde_json::Value>,
    creator_user_id: Uuid,
    creation_time: i64,
}

impl NewShopRow {
    fn from_shop(shop: &Shop) -> Result<Self, StoreError> {
        let osm_data = shop
            .osm_data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| decode_error("shops", e))?;

        Ok(Self {
            id: shop.id,
            osm_id: shop.osm_id.clone(),
            country_code: shop.country_code.map(|c| c.as_str().to_owned()),
            company_id: shop.company_id.clone(),
            address: shop.address.clone(),
            osm_data,
            creator_user_id: shop.creator_user_id,
            creation_time: shop.creation_time,
        })
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = shops)]
struct ShopPatchRow {
    country_code: Option<String>,
    company_id: Option<String>,
    address: Option<String>,
    osm_data: Option<serde_json::Value>,
}

impl ShopPatchRow {
    fn from_patch(patch: ShopPatch) -> Result<Self, StoreError> {
        let osm_data = patch
            .osm_data
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| decode_error("shops", e))?;

        Ok(Self {
            country_code: patch.country_code.map(|c| c.as_str().to_owned()),
            company_id: patch.company_id,
            address: patch.address,
            osm_data,
        })
    }
}

pub struct PgShops {
    pool: Pool,
}

impl PgShops {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Table for PgShops {
    type Id = i32;
    type Record = Shop;
    type NewRecord = Shop;
    type Patch = ShopPatch;
    type Filter = ShopFilter;

    async fn read_one(&self, id: &i32) -> Result<Option<Shop>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let row: Option<ShopRow> = shops::table
            .find(*id)
            .select(ShopRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        row.map(ShopRow::into_shop).transpose()
    }

    async fn read_many(&self, filter: &ShopFilter, limit: i64) -> Result<Vec<Shop>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let rows: Vec<ShopRow> = match filter {
            ShopFilter::OsmId(osm_id) => {
                shops::table
                    .filter(shops::osm_id.eq(osm_id.clone()))
                    .limit(limit)
                    .select(ShopRow::as_select())
                    .load(&mut conn)
                    .await?
            }
            ShopFilter::Source {
                address,
                company_id,
                country_code,
            } => {
                shops::table
                    .filter(shops::address.eq(address.clone()))
                    .filter(shops::company_id.eq(company_id.clone()))
                    .filter(shops::country_code.eq(country_code.as_str()))
                    .limit(limit)
                    .select(ShopRow::as_select())
                    .load(&mut conn)
                    .await?
            }
        };

        rows.into_iter().map(ShopRow::into_shop).collect()
    }

    async fn create_one(&self, record: Shop) -> Result<i32, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let id = diesel::insert_into(shops::table)
            .values(NewShopRow::from_shop(&record)?)
            .returning(shops::id)
            .get_result(&mut conn)
            .await?;

        Ok(id)
    }

    async fn update_one(&self, id: &i32, patch: ShopPatch) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(shops::table.find(*id))
            .set(ShopPatchRow::from_patch(patch)?)
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn update_one_by(&self, filter: &ShopFilter, patch: ShopPatch) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let patch = ShopPatchRow::from_patch(patch)?;
        let updated = match filter {
            ShopFilter::OsmId(osm_id) => {
                diesel::update(shops::table.filter(shops::osm_id.eq(osm_id.clone())))
                    .set(patch)
                    .execute(&mut conn)
                    .await?
            }
            ShopFilter::Source {
                address,
                company_id,
                country_code,
            } => {
                diesel::update(
                    shops::table
                        .filter(shops::address.eq(address.clone()))
                        .filter(shops::company_id.eq(company_id.clone()))
                        .filter(shops::country_code.eq(country_code.as_str())),
                )
                .set(patch)
                .execute(&mut conn)
                .await?
            }
        };

        Ok(updated > 0)
    }

    async fn create_or_update_one(&self, record: Shop) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let row = NewShopRow::from_shop(&record)?;
        diesel::insert_into(shops::table)
            .values(&row)
            .on_conflict(shops::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

#[derive(Debug, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = shop_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct ShopItemRow {
    id: Uuid,
    shop_id: i32,
    name: String,
    barcode: Option<String>,
    status: Option<String>,
}

impl ShopItemRow {
    fn from_item(item: &ShopItem) -> Self {
        Self {
            id: item.id,
            shop_id: item.shop_id,
            name: item.name.clone(),
            barcode: item.barcode.clone(),
            status: item.status.map(|s| s.as_str().to_owned()),
        }
    }

    fn into_item(self) -> Result<ShopItem, StoreError> {
        let status = self
            .status
            .as_deref()
            .map(ItemBarcodeStatus::from_str)
            .transpose()
            .map_err(|e| decode_error("shop_items", e))?;

        Ok(ShopItem {
            id: self.id,
            shop_id: self.shop_id,
            name: self.name,
            barcode: self.barcode,
            status,
        })
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = shop_items)]
struct ShopItemPatchRow {
    barcode: Option<String>,
    status: Option<String>,
}

impl ShopItemPatchRow {
    fn from_patch(patch: ShopItemPatch) -> Self {
        Self {
            barcode: patch.barcode,
            status: patch.status.map(|s| s.as_str().to_owned()),
        }
    }
}

pub struct PgShopItems {
    pool: Pool,
}

impl PgShopItems {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Table for PgShopItems {
    type Id = Uuid;
    type Record = ShopItem;
    type NewRecord = ShopItem;
    type Patch = ShopItemPatch;
    type Filter = ShopItemFilter;

    async fn read_one(&self, id: &Uuid) -> Result<Option<ShopItem>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let row: Option<ShopItemRow> = shop_items::table
            .find(*id)
            .select(ShopItemRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        row.map(ShopItemRow::into_item).transpose()
    }

    async fn read_many(
        &self,
        filter: &ShopItemFilter,
        limit: i64,
    ) -> Result<Vec<ShopItem>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let rows: Vec<ShopItemRow> = shop_items::table
            .filter(shop_items::name.eq(filter.name.clone()))
            .filter(shop_items::shop_id.eq(filter.shop_id))
            .limit(limit)
            .select(ShopItemRow::as_select())
            .load(&mut conn)
            .await?;

        rows.into_iter().map(ShopItemRow::into_item).collect()
    }

    async fn create_one(&self, record: ShopItem) -> Result<Uuid, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let id = diesel::insert_into(shop_items::table)
            .values(ShopItemRow::from_item(&record))
            .returning(shop_items::id)
            .get_result(&mut conn)
            .await?;

        Ok(id)
    }

    async fn update_one(&self, id: &Uuid, patch: ShopItemPatch) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(shop_items::table.find(*id))
            .set(ShopItemPatchRow::from_patch(patch))
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn update_one_by(
        &self,
        filter: &ShopItemFilter,
        patch: ShopItemPatch,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(
            shop_items::table
                .filter(shop_items::name.eq(filter.name.clone()))
                .filter(shop_items::shop_id.eq(filter.shop_id)),
        )
        .set(ShopItemPatchRow::from_patch(patch))
        .execute(&mut conn)
        .await?;

        Ok(updated > 0)
    }

    async fn create_or_update_one(&self, record: ShopItem) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let row = ShopItemRow::from_item(&record);
        diesel::insert_into(shop_items::table)
            .values(&row)
            .on_conflict(shop_items::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}
