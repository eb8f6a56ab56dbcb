//! # AppError
//!
//! Centralized error handling for the WoundLog ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all wl-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., post, report, entry)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Malformed input (e.g., empty content, unknown status)
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid credential where identity is required
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Valid identity, insufficient role or ownership
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// State-conflicting request (self-heart, double-heart, double-report,
    /// unheart-without-heart)
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Operation attempted on a synthetic featured id
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Infrastructure failure (e.g., storage unavailable)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// The short human-readable reason, without the taxonomy prefix.
    /// This is what ends up in HTTP error bodies.
    pub fn reason(&self) -> String {
        match self {
            AppError::NotFound(what, id) => format!("{what} not found with ID {id}"),
            AppError::Validation(msg)
            | AppError::Unauthenticated(msg)
            | AppError::Forbidden(msg)
            | AppError::InvalidOperation(msg)
            | AppError::Unsupported(msg)
            | AppError::Internal(msg) => msg.clone(),
        }
    }
}

/// Repository failures are infrastructure failures by definition; the
/// typed rejections are all raised by the service layer before or after
/// the storage call.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// A specialized Result type for WoundLog logic.
pub type Result<T> = std::result::Result<T, AppError>;
