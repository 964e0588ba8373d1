//! Unified service-layer error type for referral-cloud
//!
//! `ServiceError` bridges the store/domain layers and the HTTP layer so
//! handlers can use `?` without per-call-site `.map_err` boilerplate.
//! Not-found states are represented as `Option::None`, never as errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::BoxError;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// User input rejected; message names the first violated rule
    #[error("{0}")]
    Validation(String),

    /// Lost the insert race on the email unique index; callers convert this
    /// to the update path, it never reaches a response
    #[error("email already registered")]
    DuplicateEmail,

    /// No unique referral code found within the attempt bound; the code space
    /// is saturated or the store is misbehaving
    #[error("referral code generation exhausted after {attempts} attempts")]
    GenerationExhausted { attempts: u32 },

    /// Admin token mismatch
    #[error("forbidden")]
    Forbidden,

    /// Database or infrastructure error (sqlx, csv, etc.)
    #[error("{0}")]
    Db(BoxError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<csv::Error> for ServiceError {
    fn from(e: csv::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::Validation(message) => {
                (StatusCode::BAD_REQUEST, message).into_response()
            }
            ServiceError::DuplicateEmail => {
                (StatusCode::CONFLICT, "Email already registered").into_response()
            }
            ServiceError::GenerationExhausted { attempts } => {
                tracing::error!(attempts, "Referral code generation exhausted");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
            ServiceError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
            ServiceError::Db(e) => {
                tracing::error!(error = %e, "Service database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
