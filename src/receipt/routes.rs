use axum::{
    Router,
    routing::{get, post},
};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new()
        .route("/receipt/get-by-id", get(handlers::get_receipt_by_id))
        .route("/receipt/get-or-create", post(handlers::get_or_create_receipt))
        .route("/receipt/get-by-url", post(handlers::get_receipt_by_url))
        .route("/receipt/add-shop-id", post(handlers::add_shop))
}
