//! Request identity extractors.
//!
//! Token verification happens in exactly one place: routes declare either
//! `Identity` (401 without a valid credential) or `MaybeIdentity` (absent
//! or bad credentials quietly resolve to anonymous) and handlers never
//! look at the Authorization header themselves.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use uuid::Uuid;

use wl_core::error::AppError;

use crate::error::ApiError;
use crate::handlers::AppState;

/// A verified caller. Extraction fails with 401 when the bearer token is
/// missing, malformed, forged, or expired.
pub struct Identity(pub Uuid);

/// Best-effort caller identity for endpoints open to anonymous use.
pub struct MaybeIdentity(pub Option<Uuid>);

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn verify(req: &HttpRequest) -> Result<Uuid, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError(AppError::Internal("app state missing".into())))?;
    let token = bearer_token(req).ok_or_else(|| {
        ApiError(AppError::Unauthenticated("Missing or invalid token".into()))
    })?;
    state.verifier.verify(token).map_err(ApiError::from)
}

impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(verify(req).map(Identity))
    }
}

impl FromRequest for MaybeIdentity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MaybeIdentity(verify(req).ok())))
    }
}
