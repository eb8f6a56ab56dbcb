//! Maps the domain error taxonomy onto HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use wl_core::error::AppError;

/// Newtype so the orphan rule lets us hang `ResponseError` on `AppError`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Validation(_)
            | AppError::InvalidOperation(_)
            | AppError::Unsupported(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let reason = match &self.0 {
            // storage details stay in the log, not on the wire
            AppError::Internal(detail) => {
                log::error!("internal error: {detail}");
                "Internal server error".to_string()
            }
            err => err.reason(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": reason }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (AppError::NotFound("post".into(), "x".into()), 404),
            (AppError::Validation("bad".into()), 400),
            (AppError::InvalidOperation("conflict".into()), 400),
            (AppError::Unsupported("featured".into()), 400),
            (AppError::Unauthenticated("who".into()), 401),
            (AppError::Forbidden("no".into()), 403),
            (AppError::Internal("boom".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status_code().as_u16(), status);
        }
    }
}
