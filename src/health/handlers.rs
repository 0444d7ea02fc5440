use std::time::Duration;

use axum::extract::Json;

use crate::utils::response::ApiResponse;

pub async fn home() -> Json<ApiResponse<()>> {
    tracing::info!("Plant-Based API home endpoint called");
    health().await
}

pub async fn health() -> Json<ApiResponse<()>> {
    tracing::info!("Plant-Based API health endpoint called");
    Json(ApiResponse::message("Plant-Based API health check successful"))
}

/// Health check that holds the connection for a second, for probing timeout
/// behavior of the hosting environment.
pub async fn deep_ping() -> Json<ApiResponse<()>> {
    tracing::info!("Plant-Based API deep ping endpoint called");
    tokio::time::sleep(Duration::from_secs(1)).await;
    Json(ApiResponse::message("Plant-Based API deep ping successful"))
}
