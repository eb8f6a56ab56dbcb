//! # wl-api
//!
//! The web routing and orchestration layer for WoundLog.

pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;

use actix_web::web;

pub use handlers::AppState;

/// Configures the routes for the service.
///
/// # Developer Note
/// Literal segments (`/top`, `/liked`, `/reports`) are registered ahead
/// of `/{id}` so they are never captured as post ids. We use a scoped
/// configuration so the binary can mount everything under a prefix if it
/// ever needs to (e.g. /api/v1/).
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bleed")
            .route("", web::get().to(handlers::list_posts))
            .route("", web::post().to(handlers::create_post))
            .route("/top", web::get().to(handlers::top_posts))
            .route("/liked", web::get().to(handlers::liked_posts))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports/{id}", web::patch().to(handlers::review_report))
            .route("/{id}", web::get().to(handlers::get_post))
            .route("/{id}", web::delete().to(handlers::delete_post))
            .route("/{id}/report", web::post().to(handlers::report_post))
            .route("/{id}/heart", web::post().to(handlers::heart_post))
            .route("/{id}/heart", web::delete().to(handlers::unheart_post))
            .route("/{id}/hide", web::patch().to(handlers::hide_post)),
    )
    .service(
        web::scope("/entries")
            .route("", web::get().to(handlers::list_entries))
            .route("", web::post().to(handlers::create_entry))
            .route("/{id}", web::get().to(handlers::get_entry))
            .route("/{id}", web::put().to(handlers::update_entry))
            .route("/{id}", web::delete().to(handlers::delete_entry)),
    )
    .service(web::scope("/analytics").route("/moods", web::get().to(handlers::mood_analytics)));
}
