use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::models::{IdentityKey, IdentityPatch, IdentityProvider, NewUser, User, UserIdentity, UserPatch};
use crate::schema::{user_identities, users};
use crate::store::{StoreError, Table, connection_error, decode_error};
use crate::utils::types::Pool;

pub struct PgUsers {
    pool: Pool,
}

impl PgUsers {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Table for PgUsers {
    type Id = Uuid;
    type Record = User;
    type NewRecord = NewUser;
    type Patch = UserPatch;
    type Filter = ();

    async fn read_one(&self, id: &Uuid) -> Result<Option<User>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let user = users::table
            .find(*id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        Ok(user)
    }

    async fn read_many(&self, _filter: &(), limit: i64) -> Result<Vec<User>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let res = users::table
            .limit(limit)
            .select(User::as_select())
            .load(&mut conn)
            .await?;

        Ok(res)
    }

    async fn create_one(&self, record: NewUser) -> Result<Uuid, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let user = User {
            id: Uuid::new_v4(),
            email: record.email,
            name: record.name,
        };

        let id = diesel::insert_into(users::table)
            .values(&user)
            .returning(users::id)
            .get_result(&mut conn)
            .await?;

        Ok(id)
    }

    async fn update_one(&self, id: &Uuid, patch: UserPatch) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(users::table.find(*id))
            .set(&patch)
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn update_one_by(&self, _filter: &(), patch: UserPatch) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(users::table)
            .set(&patch)
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn create_or_update_one(&self, record: User) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        diesel::insert_into(users::table)
            .values(&record)
            .on_conflict(users::id)
            .do_update()
            .set(&record)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

#[derive(Debug, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = user_identities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct UserIdentityRow {
    id: String,
    provider: String,
    user_id: Uuid,
}

impl UserIdentityRow {
    fn from_identity(identity: &UserIdentity) -> Self {
        Self {
            id: identity.id.clone(),
            provider: identity.provider.as_str().to_owned(),
            user_id: identity.user_id,
        }
    }

    fn into_identity(self) -> Result<UserIdentity, StoreError> {
        let provider = IdentityProvider::from_str(&self.provider)
            .map_err(|e| decode_error("user_identities", e))?;

        Ok(UserIdentity {
            id: self.id,
            provider,
            user_id: self.user_id,
        })
    }
}

pub struct PgIdentities {
    pool: Pool,
}

impl PgIdentities {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Table for PgIdentities {
    type Id = String;
    type Record = UserIdentity;
    type NewRecord = UserIdentity;
    type Patch = IdentityPatch;
    type Filter = IdentityKey;

    async fn read_one(&self, id: &String) -> Result<Option<UserIdentity>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let row: Option<UserIdentityRow> = user_identities::table
            .filter(user_identities::id.eq(id.clone()))
            .select(UserIdentityRow::as_select())
            .first(&mut conn)
            .await
            .optional()?;

        row.map(UserIdentityRow::into_identity).transpose()
    }

    async fn read_many(
        &self,
        filter: &IdentityKey,
        limit: i64,
    ) -> Result<Vec<UserIdentity>, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let rows: Vec<UserIdentityRow> = user_identities::table
            .filter(user_identities::id.eq(filter.id.clone()))
            .filter(user_identities::provider.eq(filter.provider.as_str()))
            .limit(limit)
            .select(UserIdentityRow::as_select())
            .load(&mut conn)
            .await?;

        rows.into_iter().map(UserIdentityRow::into_identity).collect()
    }

    async fn create_one(&self, record: UserIdentity) -> Result<String, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let id = diesel::insert_into(user_identities::table)
            .values(UserIdentityRow::from_identity(&record))
            .returning(user_identities::id)
            .get_result(&mut conn)
            .await?;

        Ok(id)
    }

    async fn update_one(&self, id: &String, patch: IdentityPatch) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(user_identities::table.filter(user_identities::id.eq(id.clone())))
            .set(&patch)
            .execute(&mut conn)
            .await?;

        Ok(updated > 0)
    }

    async fn update_one_by(
        &self,
        filter: &IdentityKey,
        patch: IdentityPatch,
    ) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let updated = diesel::update(
            user_identities::table
                .filter(user_identities::id.eq(filter.id.clone()))
                .filter(user_identities::provider.eq(filter.provider.as_str())),
        )
        .set(&patch)
        .execute(&mut conn)
        .await?;

        Ok(updated > 0)
    }

    async fn create_or_update_one(&self, record: UserIdentity) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(connection_error)?;

        let row = UserIdentityRow::from_identity(&record);
        diesel::insert_into(user_identities::table)
            .values(&row)
            .on_conflict((user_identities::id, user_identities::provider))
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}
