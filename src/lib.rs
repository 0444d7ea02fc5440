use diesel::prelude::*;
use dotenvy::dotenv;
use std::env;

pub mod health;
pub mod pool;
pub mod receipt;
pub mod schema;
pub mod shop;
pub mod store;
pub mod user;
pub mod utils;

pub fn establish_connection() -> PgConnection {
    dotenv().ok();

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgConnection::establish(&db_url)
        .unwrap_or_else(|_| panic!("failed to connect to db url {}", db_url))
}
