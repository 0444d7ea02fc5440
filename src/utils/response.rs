use axum::http::StatusCode;
use serde::Serialize;

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub detail: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(detail: &str, data: T) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            detail: detail.to_owned(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(detail: &str) -> Self {
        Self {
            status_code: StatusCode::OK.as_u16(),
            detail: detail.to_owned(),
            data: None,
        }
    }
}
