use axum::extract::{Json, State};

use super::models::{
    GetOrCreateUserByIdentityRequest, IdentityKey, IdentityPatch, IdentityProvider, NewUser, User,
    UserIdentity,
};
use super::store::{PgIdentities, PgUsers};
use crate::store::{StoreError, Table};
use crate::utils::error::HandlerError;
use crate::utils::response::ApiResponse;
use crate::utils::types::Pool;
use crate::utils::{internal_error, types};
use uuid::Uuid;

/// Point lookup of an identity by its composite `(id, provider)` key.
pub async fn find<I>(
    identities: &I,
    id: &str,
    provider: IdentityProvider,
) -> Result<Option<UserIdentity>, StoreError>
where
    I: Table<Record = UserIdentity, Filter = IdentityKey>,
{
    tracing::info!("Finding user identity: {} for provider: {}", id, provider);

    let key = IdentityKey {
        id: id.to_owned(),
        provider,
    };

    Ok(identities.read_many(&key, 1).await?.into_iter().next())
}

pub async fn create<I>(identities: &I, identity: UserIdentity) -> Result<String, StoreError>
where
    I: Table<Id = String, NewRecord = UserIdentity>,
{
    tracing::info!(
        "Creating user identity: {} for provider: {}",
        identity.id,
        identity.provider
    );

    identities.create_one(identity).await
}

/// Updates the identity located by `(id, provider)`. The patch type carries
/// everything but the key fields, so the key itself stays immutable.
pub async fn update<I>(identities: &I, identity: UserIdentity) -> Result<bool, StoreError>
where
    I: Table<Filter = IdentityKey, Patch = IdentityPatch>,
{
    tracing::info!(
        "Updating user identity: {} for provider: {}",
        identity.id,
        identity.provider
    );

    let key = IdentityKey {
        id: identity.id,
        provider: identity.provider,
    };

    identities
        .update_one_by(
            &key,
            IdentityPatch {
                user_id: identity.user_id,
            },
        )
        .await
}

/// Resolves an identity to its user, creating both rows on first login.
///
/// The two writes are not transactional: if the identity insert fails after
/// the user insert succeeded, an orphan user row remains.
pub async fn get_or_create_user_by_identity<U, I>(
    users: &U,
    identities: &I,
    id: &str,
    provider: IdentityProvider,
    email: Option<String>,
    name: String,
) -> Result<User, HandlerError>
where
    U: Table<Id = Uuid, Record = User, NewRecord = NewUser>,
    I: Table<Id = String, Record = UserIdentity, NewRecord = UserIdentity, Filter = IdentityKey>,
{
    if let Some(identity) = find(identities, id, provider).await? {
        tracing::info!("Found existing identity for user: {}", identity.user_id);

        return users
            .read_one(&identity.user_id)
            .await?
            .ok_or(HandlerError::MissingUser(identity.user_id));
    }

    tracing::info!("Identity not found. Creating new user for {} id {}", provider, id);

    let user_id = users
        .create_one(NewUser {
            email: email.clone(),
            name: name.clone(),
        })
        .await?;

    tracing::info!("Creating new identity for user: {}", user_id);

    let identity = UserIdentity {
        id: id.to_owned(),
        provider,
        user_id,
    };
    create(identities, identity).await?;

    Ok(User {
        id: user_id,
        email,
        name,
    })
}

pub async fn get_or_create_by_identity(
    State(pool): State<Pool>,
    Json(payload): Json<GetOrCreateUserByIdentityRequest>,
) -> types::Result<ApiResponse<User>> {
    tracing::info!(
        "User identity: {} for provider: {}",
        payload.id,
        payload.provider
    );

    let users = PgUsers::new(pool.clone());
    let identities = PgIdentities::new(pool);

    let user = get_or_create_user_by_identity(
        &users,
        &identities,
        &payload.id,
        payload.provider,
        payload.email,
        payload.name,
    )
    .await
    .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "User retrieved or created successfully",
        user,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::MemTable;

    fn identity_tables() -> (MemTable<User>, MemTable<UserIdentity>) {
        (MemTable::new(), MemTable::new())
    }

    #[tokio::test]
    async fn find_returns_existing_identity() {
        let user_id = Uuid::new_v4();
        let identities = MemTable::with_rows(vec![UserIdentity {
            id: "google_123".to_owned(),
            provider: IdentityProvider::Google,
            user_id,
        }]);

        let found = find(&identities, "google_123", IdentityProvider::Google)
            .await
            .unwrap();

        let identity = found.expect("identity should be found");
        assert_eq!(identity.id, "google_123");
        assert_eq!(identity.user_id, user_id);
    }

    #[tokio::test]
    async fn find_misses_on_wrong_provider() {
        let identities = MemTable::with_rows(vec![UserIdentity {
            id: "subject_1".to_owned(),
            provider: IdentityProvider::Google,
            user_id: Uuid::new_v4(),
        }]);

        let found = find(&identities, "subject_1", IdentityProvider::Telegram)
            .await
            .unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn create_returns_subject_id() {
        let identities: MemTable<UserIdentity> = MemTable::new();
        let identity = UserIdentity {
            id: "google_123".to_owned(),
            provider: IdentityProvider::Google,
            user_id: Uuid::new_v4(),
        };

        let created = create(&identities, identity).await.unwrap();

        assert_eq!(created, "google_123");
        assert_eq!(identities.len(), 1);
    }

    #[tokio::test]
    async fn update_rewrites_user_id_but_never_the_key() {
        let old_user = Uuid::new_v4();
        let new_user = Uuid::new_v4();
        let identities = MemTable::with_rows(vec![UserIdentity {
            id: "subject_1".to_owned(),
            provider: IdentityProvider::Apple,
            user_id: old_user,
        }]);

        let updated = update(
            &identities,
            UserIdentity {
                id: "subject_1".to_owned(),
                provider: IdentityProvider::Apple,
                user_id: new_user,
            },
        )
        .await
        .unwrap();

        assert!(updated);
        let rows = identities.rows();
        assert_eq!(rows[0].id, "subject_1");
        assert_eq!(rows[0].provider, IdentityProvider::Apple);
        assert_eq!(rows[0].user_id, new_user);
    }

    #[tokio::test]
    async fn update_reports_false_for_unknown_key() {
        let identities: MemTable<UserIdentity> = MemTable::new();

        let updated = update(
            &identities,
            UserIdentity {
                id: "missing".to_owned(),
                provider: IdentityProvider::Google,
                user_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();

        assert!(!updated);
    }

    #[tokio::test]
    async fn first_login_creates_user_and_identity() {
        let (users, identities) = identity_tables();

        let user = get_or_create_user_by_identity(
            &users,
            &identities,
            "google_123",
            IdentityProvider::Google,
            Some("ana@example.com".to_owned()),
            "Ana".to_owned(),
        )
        .await
        .unwrap();

        assert_eq!(user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(user.name, "Ana");
        assert_eq!(users.len(), 1);
        assert_eq!(identities.len(), 1);
        assert_eq!(identities.rows()[0].user_id, user.id);
    }

    #[tokio::test]
    async fn repeat_login_returns_same_user_without_new_rows() {
        let (users, identities) = identity_tables();

        let first = get_or_create_user_by_identity(
            &users,
            &identities,
            "google_123",
            IdentityProvider::Google,
            None,
            "Ana".to_owned(),
        )
        .await
        .unwrap();

        let second = get_or_create_user_by_identity(
            &users,
            &identities,
            "google_123",
            IdentityProvider::Google,
            None,
            "Ana".to_owned(),
        )
        .await
        .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(users.len(), 1);
        assert_eq!(identities.len(), 1);
    }

    #[tokio::test]
    async fn same_subject_id_under_another_provider_is_a_new_user() {
        let (users, identities) = identity_tables();

        let google = get_or_create_user_by_identity(
            &users,
            &identities,
            "subject_1",
            IdentityProvider::Google,
            None,
            "Ana".to_owned(),
        )
        .await
        .unwrap();

        let telegram = get_or_create_user_by_identity(
            &users,
            &identities,
            "subject_1",
            IdentityProvider::Telegram,
            None,
            "Ana".to_owned(),
        )
        .await
        .unwrap();

        assert_ne!(google.id, telegram.id);
        assert_eq!(users.len(), 2);
        assert_eq!(identities.len(), 2);
    }

    #[tokio::test]
    async fn identity_pointing_at_missing_user_is_an_integrity_fault() {
        let users: MemTable<User> = MemTable::new();
        let orphan_user = Uuid::new_v4();
        let identities = MemTable::with_rows(vec![UserIdentity {
            id: "subject_1".to_owned(),
            provider: IdentityProvider::Google,
            user_id: orphan_user,
        }]);

        let err = get_or_create_user_by_identity(
            &users,
            &identities,
            "subject_1",
            IdentityProvider::Google,
            None,
            "Ana".to_owned(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, HandlerError::MissingUser(id) if id == orphan_user));
    }
}
