//! woundlog/crates/wl-api/src/middleware.rs
//!
//! Standard middleware for logging and cross-origin access.

use actix_cors::Cors;
use actix_web::middleware::Logger;

// Returns the standard access logger:
// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

// CORS policy for the JSON API. The journal/wall clients are served from
// their own origin, so everything is cross-origin in practice.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allow_any_header()
        .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"])
        .max_age(3600)
}
