use axum::{Router, routing::post};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new().route("/shop/get-or-create", post(handlers::get_or_create_shop))
}
