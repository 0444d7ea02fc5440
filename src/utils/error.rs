use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Failures raised by the entity handlers on top of plain store errors.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An identity row points at a user row that does not exist. Nothing in
    /// the handlers defends against this; it surfaces as a server fault.
    #[error("user {0} referenced by an identity does not exist")]
    MissingUser(Uuid),

    #[error("update failed for receipt {0}")]
    UpdateFailed(String),
}

pub fn internal_error<E>(err: E) -> (StatusCode, String)
where
    E: std::error::Error,
{
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "no such route")
}
