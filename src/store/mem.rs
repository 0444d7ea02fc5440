//! In-memory `Table` implementation backing the unit suites, standing in for
//! the relational store.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use uuid::Uuid;

use super::{StoreError, Table};
use crate::receipt::models::{Receipt, ReceiptUrl, ReceiptUrlPatch};
use crate::shop::models::{Shop, ShopFilter, ShopItem, ShopItemFilter, ShopItemPatch, ShopPatch};
use crate::user::models::{IdentityKey, IdentityPatch, NewUser, User, UserIdentity, UserPatch};

/// Per-entity glue the generic table needs: identity, filter matching, id
/// assignment on insert, patch application.
pub trait MemRecord: Clone + Send + Sync {
    type Id: Clone + PartialEq + Send + Sync;
    type New: Send + Sync;
    type Patch: Send + Sync;
    type Filter: Send + Sync;

    fn id(&self) -> Self::Id;
    fn matches(&self, filter: &Self::Filter) -> bool;
    fn build(new: Self::New, seq: i64) -> Self;
    fn apply(&mut self, patch: &Self::Patch);
}

pub struct MemTable<R> {
    rows: Mutex<Vec<R>>,
    seq: AtomicI64,
}

impl<R: MemRecord> MemTable<R> {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            seq: AtomicI64::new(1),
        }
    }

    pub fn with_rows(rows: Vec<R>) -> Self {
        Self {
            rows: Mutex::new(rows),
            seq: AtomicI64::new(1),
        }
    }

    pub fn rows(&self) -> Vec<R> {
        self.rows.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

impl<R: MemRecord> Default for MemTable<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: MemRecord + 'static> Table for MemTable<R> {
    type Id = R::Id;
    type Record = R;
    type NewRecord = R::New;
    type Patch = R::Patch;
    type Filter = R::Filter;

    async fn read_one(&self, id: &Self::Id) -> Result<Option<R>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id() == *id)
            .cloned())
    }

    async fn read_many(&self, filter: &Self::Filter, limit: i64) -> Result<Vec<R>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.matches(filter))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn create_one(&self, record: Self::NewRecord) -> Result<Self::Id, StoreError> {
        let row = R::build(record, self.seq.fetch_add(1, Ordering::SeqCst));
        let id = row.id();
        self.rows.lock().unwrap().push(row);
        Ok(id)
    }

    async fn update_one(&self, id: &Self::Id, patch: Self::Patch) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|row| row.id() == *id) {
            Some(row) => {
                row.apply(&patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_one_by(
        &self,
        filter: &Self::Filter,
        patch: Self::Patch,
    ) -> Result<bool, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|row| row.matches(filter)) {
            Some(row) => {
                row.apply(&patch);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_or_update_one(&self, record: R) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let id = record.id();
        match rows.iter_mut().find(|row| row.id() == id) {
            Some(row) => *row = record,
            None => rows.push(record),
        }
        Ok(())
    }
}

impl MemRecord for User {
    type Id = Uuid;
    type New = NewUser;
    type Patch = UserPatch;
    type Filter = ();

    fn id(&self) -> Uuid {
        self.id
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn build(new: NewUser, _seq: i64) -> Self {
        User {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
        }
    }

    fn apply(&mut self, patch: &UserPatch) {
        if let Some(email) = &patch.email {
            self.email = Some(email.clone());
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
    }
}

impl MemRecord for UserIdentity {
    type Id = String;
    type New = UserIdentity;
    type Patch = IdentityPatch;
    type Filter = IdentityKey;

    fn id(&self) -> String {
        self.id.clone()
    }

    fn matches(&self, filter: &IdentityKey) -> bool {
        self.id == filter.id && self.provider == filter.provider
    }

    fn build(new: UserIdentity, _seq: i64) -> Self {
        new
    }

    fn apply(&mut self, patch: &IdentityPatch) {
        self.user_id = patch.user_id;
    }
}

impl MemRecord for Shop {
    type Id = i32;
    type New = Shop;
    type Patch = ShopPatch;
    type Filter = ShopFilter;

    fn id(&self) -> i32 {
        self.id.unwrap_or_default()
    }

    fn matches(&self, filter: &ShopFilter) -> bool {
        match filter {
            ShopFilter::OsmId(osm_id) => self.osm_id == *osm_id,
            ShopFilter::Source {
                address,
                company_id,
                country_code,
            } => {
                self.address.as_deref() == Some(address.as_str())
                    && self.company_id.as_deref() == Some(company_id.as_str())
                    && self.country_code == Some(*country_code)
            }
        }
    }

    fn build(new: Shop, seq: i64) -> Self {
        let mut shop = new;
        if shop.id.is_none() {
            shop.id = Some(seq as i32);
        }
        shop
    }

    fn apply(&mut self, patch: &ShopPatch) {
        if let Some(country_code) = patch.country_code {
            self.country_code = Some(country_code);
        }
        if let Some(company_id) = &patch.company_id {
            self.company_id = Some(company_id.clone());
        }
        if let Some(address) = &patch.address {
            self.address = Some(address.clone());
        }
        if let Some(osm_data) = &patch.osm_data {
            self.osm_data = Some(osm_data.clone());
        }
    }
}

impl MemRecord for ShopItem {
    type Id = Uuid;
    type New = ShopItem;
    type Patch = ShopItemPatch;
    type Filter = ShopItemFilter;

    fn id(&self) -> Uuid {
        self.id
    }

    fn matches(&self, filter: &ShopItemFilter) -> bool {
        self.name == filter.name && self.shop_id == filter.shop_id
    }

    fn build(new: ShopItem, _seq: i64) -> Self {
        new
    }

    fn apply(&mut self, patch: &ShopItemPatch) {
        if let Some(barcode) = &patch.barcode {
            self.barcode = Some(barcode.clone());
        }
        if let Some(status) = patch.status {
            self.status = Some(status);
        }
    }
}

impl MemRecord for Receipt {
    type Id = String;
    type New = Receipt;
    type Patch = Receipt;
    type Filter = ();

    fn id(&self) -> String {
        self.id.clone()
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn build(new: Receipt, _seq: i64) -> Self {
        new
    }

    fn apply(&mut self, patch: &Receipt) {
        let id = self.id.clone();
        *self = patch.clone();
        self.id = id;
    }
}

impl MemRecord for ReceiptUrl {
    type Id = String;
    type New = ReceiptUrl;
    type Patch = ReceiptUrlPatch;
    type Filter = ();

    fn id(&self) -> String {
        self.id.clone()
    }

    fn matches(&self, _filter: &()) -> bool {
        true
    }

    fn build(new: ReceiptUrl, _seq: i64) -> Self {
        new
    }

    fn apply(&mut self, patch: &ReceiptUrlPatch) {
        if let Some(receipt_id) = &patch.receipt_id {
            self.receipt_id = receipt_id.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::models::IdentityProvider;

    #[tokio::test]
    async fn create_one_assigns_sequential_shop_ids() {
        let shops: MemTable<Shop> = MemTable::new();
        let shop = Shop {
            id: None,
            osm_id: "1:1".to_owned(),
            country_code: None,
            company_id: None,
            address: None,
            osm_data: None,
            creator_user_id: Uuid::new_v4(),
            creation_time: 0,
        };

        let first = shops.create_one(shop.clone()).await.unwrap();
        let second = shops
            .create_one(Shop {
                osm_id: "1:2".to_owned(),
                ..shop
            })
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn create_or_update_one_replaces_by_id() {
        let identities: MemTable<UserIdentity> = MemTable::new();
        let first = UserIdentity {
            id: "subject".to_owned(),
            provider: IdentityProvider::Google,
            user_id: Uuid::new_v4(),
        };
        identities.create_or_update_one(first.clone()).await.unwrap();

        let replacement_user = Uuid::new_v4();
        identities
            .create_or_update_one(UserIdentity {
                user_id: replacement_user,
                ..first
            })
            .await
            .unwrap();

        assert_eq!(identities.len(), 1);
        assert_eq!(identities.rows()[0].user_id, replacement_user);
    }

    #[tokio::test]
    async fn read_many_honors_the_limit() {
        let users = MemTable::with_rows(vec![
            User {
                id: Uuid::new_v4(),
                email: None,
                name: "a".to_owned(),
            },
            User {
                id: Uuid::new_v4(),
                email: None,
                name: "b".to_owned(),
            },
        ]);

        let loaded = users.read_many(&(), 1).await.unwrap();

        assert_eq!(loaded.len(), 1);
    }
}
