//! # WoundLog Binary
//!
//! The entry point that assembles the application based on compile-time features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use wl_api::handlers::AppState;
use wl_api::middleware;
use wl_core::wall::BleedWall;

// Feature-gated imports: the binary is compiled-to-order
#[cfg(feature = "db-sqlite")]
use wl_db_sqlite::SqliteStore;

#[cfg(feature = "auth-simple")]
use wl_auth_simple::HmacTokenAuthority;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let addr = std::env::var("WOUNDLOG_ADDR").unwrap_or_else(|_| "127.0.0.1:4000".into());
    let db_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:woundlog.db".into());
    let secret =
        std::env::var("WOUNDLOG_AUTH_SECRET").unwrap_or_else(|_| "dev_secret".into());

    // 1. Initialize the storage implementation
    #[cfg(feature = "db-sqlite")]
    let store = SqliteStore::connect(&db_url)
        .await
        .expect("Failed to init SQLite");

    // 2. Initialize the credential verifier
    #[cfg(feature = "auth-simple")]
    let verifier = HmacTokenAuthority::new(&secret);

    // 3. Wrap everything in shared state (dynamic dispatch keeps the
    //    handler code independent of the chosen plugins)
    let state = web::Data::new(AppState {
        wall: BleedWall::new(
            Arc::new(store.posts()),
            Arc::new(store.reports()),
            Arc::new(store.users()),
        ),
        entries: Arc::new(store.entries()),
        verifier: Arc::new(verifier),
    });

    log::info!("🩸 WoundLog listening on http://{addr}");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .configure(wl_api::configure_routes)
    })
    .bind(addr)?
    .run()
    .await
}
