use axum::{Router, routing::post};

use super::handlers;
use crate::utils::types::Pool;

pub fn get_routes() -> Router<Pool> {
    Router::new().route(
        "/user/get-or-create-by-identity",
        post(handlers::get_or_create_by_identity),
    )
}
