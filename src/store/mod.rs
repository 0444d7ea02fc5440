use async_trait::async_trait;
use thiserror::Error;

#[cfg(test)]
pub mod mem;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(String),

    #[error("query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("failed to decode {table} row: {reason}")]
    Decode {
        table: &'static str,
        reason: String,
    },
}

pub(crate) fn connection_error<E: std::fmt::Display>(err: E) -> StoreError {
    StoreError::Connection(err.to_string())
}

pub(crate) fn decode_error<E: std::fmt::Display>(table: &'static str, err: E) -> StoreError {
    StoreError::Decode {
        table,
        reason: err.to_string(),
    }
}

/// One logical table of the persistence collaborator.
///
/// Each entity table gets its own value implementing this trait, passed
/// explicitly to the handler functions that read or write it. Filters are
/// AND-combined equality matches; `create_one` omits an absent id so the
/// store can assign one.
#[async_trait]
pub trait Table: Send + Sync {
    type Id: Send + Sync;
    type Record: Send + Sync;
    type NewRecord: Send + Sync;
    type Patch: Send + Sync;
    type Filter: Send + Sync;

    /// Point lookup by primary identifier. Absence is not an error.
    async fn read_one(&self, id: &Self::Id) -> Result<Option<Self::Record>, StoreError>;

    /// Filtered lookup, at most `limit` rows.
    async fn read_many(
        &self,
        filter: &Self::Filter,
        limit: i64,
    ) -> Result<Vec<Self::Record>, StoreError>;

    /// Insert, returning the assigned identifier.
    async fn create_one(&self, record: Self::NewRecord) -> Result<Self::Id, StoreError>;

    /// Update the row with the given id; false when nothing matched.
    async fn update_one(&self, id: &Self::Id, patch: Self::Patch) -> Result<bool, StoreError>;

    /// Update the row(s) matching the filter; false when nothing matched.
    async fn update_one_by(
        &self,
        filter: &Self::Filter,
        patch: Self::Patch,
    ) -> Result<bool, StoreError>;

    /// Insert-or-update keyed by the record's primary identifier.
    async fn create_or_update_one(&self, record: Self::Record) -> Result<(), StoreError>;
}
