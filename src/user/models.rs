use crate::schema::users;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Insertable, AsChangeset,
)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserPatch {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// External identity provider a user can log in through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProvider {
    Google,
    Apple,
    Telegram,
    Appwrite,
    Supabase,
}

impl IdentityProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Apple => "apple",
            Self::Telegram => "telegram",
            Self::Appwrite => "appwrite",
            Self::Supabase => "supabase",
        }
    }
}

impl std::str::FromStr for IdentityProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "google" => Ok(Self::Google),
            "apple" => Ok(Self::Apple),
            "telegram" => Ok(Self::Telegram),
            "appwrite" => Ok(Self::Appwrite),
            "supabase" => Ok(Self::Supabase),
            other => Err(format!("unknown identity provider: {other}")),
        }
    }
}

impl std::fmt::Display for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Link between a provider-scoped subject id and a user. The `(id, provider)`
/// pair is unique; the same subject id may exist under different providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub provider: IdentityProvider,
    pub user_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct IdentityKey {
    pub id: String,
    pub provider: IdentityProvider,
}

/// Update payload for an identity. The key fields are deliberately absent so
/// an update can never rewrite them.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = crate::schema::user_identities)]
pub struct IdentityPatch {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct GetOrCreateUserByIdentityRequest {
    pub id: String,
    pub provider: IdentityProvider,
    pub email: Option<String>,
    pub name: String,
}
