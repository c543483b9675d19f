//! Error types and HTTP error response handling.
//!
//! Business-rule violations (insufficient balance, username already set,
//! invalid amounts) are expected outcomes and carry their own variants so
//! callers can tell them apart from infrastructure failures. Every failure
//! leaves stored state untouched; that guarantee comes from the store's
//! atomic commits, not from cleanup code here.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Application-wide error type.
///
/// # Status Code Mapping
///
/// - `UserNotFound` / `OrderNotFound` → 404 Not Found
/// - `UsernameAlreadyAssigned`, `InsufficientBalance`, `InvalidAmount`,
///   `InvalidInput` → 400 Bad Request
/// - `Conflict` → 409 Conflict (commit contention that survived retries)
/// - `Store` → 503 Service Unavailable (details hidden from the client)
/// - `BadDocument` → 500 Internal Server Error
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No user exists under the supplied identifier.
    #[error("user not found")]
    UserNotFound,

    /// No order exists under the supplied identifier.
    #[error("order not found")]
    OrderNotFound,

    /// The user's username is already set; it is a set-once field.
    #[error("username already set")]
    UsernameAlreadyAssigned,

    /// The user's balance does not cover the requested debit.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// A negative or otherwise unusable amount was supplied.
    #[error("{0}")]
    InvalidAmount(String),

    /// The request was well-formed JSON but violated a field rule.
    #[error("{0}")]
    InvalidInput(String),

    /// Commit contention persisted past the bounded retry policy.
    #[error("too much contention, please retry")]
    Conflict,

    /// The store failed; the caller may retry the request.
    #[error("store unavailable")]
    Store(#[source] StoreError),

    /// A stored document no longer matches the expected shape.
    #[error("malformed document: {0}")]
    BadDocument(#[from] serde_json::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => AppError::Conflict,
            backend => AppError::Store(backend),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// All failures share one envelope:
///
/// ```json
/// {
///   "success": false,
///   "error": "Human-readable error message"
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::UserNotFound | AppError::OrderNotFound => StatusCode::NOT_FOUND,
            AppError::UsernameAlreadyAssigned
            | AppError::InsufficientBalance
            | AppError::InvalidAmount(_)
            | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::BadDocument(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Infrastructure failures are logged with their source; the client
        // only sees the generic message.
        match &self {
            AppError::Store(source) => tracing::error!(error = %source, "store failure"),
            AppError::BadDocument(source) => {
                tracing::error!(error = %source, "malformed document")
            }
            _ => {}
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
