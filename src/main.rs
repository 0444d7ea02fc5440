use axum::Router;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use listenfd::ListenFd;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{EnvFilter, fmt};

use pbapi::{health, pool, receipt, shop, user, utils};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    tokio::task::spawn_blocking(|| {
        let mut conn = pbapi::establish_connection();
        conn.run_pending_migrations(MIGRATIONS)
            .map(|_| ())
            .expect("failed to run pending migrations");
    })
    .await
    .unwrap();

    let pool = pool::get_pool().await.unwrap();

    let api = Router::new()
        .merge(user::routes::get_routes())
        .merge(shop::routes::get_routes())
        .merge(receipt::routes::get_routes());

    let app = Router::new()
        .merge(health::routes::get_routes())
        .nest("/api", api)
        .fallback(utils::handler_404)
        // dashboard runs on another origin
        .layer(CorsLayer::permissive())
        .with_state(pool);

    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0).unwrap() {
        // if we are given a tcp listener on listen fd 0, we use that one
        Some(listener) => {
            listener.set_nonblocking(true).unwrap();
            TcpListener::from_std(listener).unwrap()
        }
        // otherwise fall back to local listening
        None => TcpListener::bind("127.0.0.1:3000").await.unwrap(),
    };

    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
