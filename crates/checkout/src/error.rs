//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Validation-stage rejections
//! surface their reason verbatim; unexpected store/gateway failures are
//! captured to Sentry and converted to a generic message, never leaked with
//! raw internal detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::CheckoutError;

/// Application-level error type for the checkout service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Checkout workflow error.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Database operation failed outside a workflow.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// No valid user identity on the request.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::InactiveProduct { .. }
                | CheckoutError::OutOfStock { .. }
                | CheckoutError::InsufficientStock { .. }
                | CheckoutError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                CheckoutError::AmountMismatch { .. } | CheckoutError::InvalidState { .. } => {
                    StatusCode::CONFLICT
                }
                CheckoutError::PaymentNotApproved { .. } => StatusCode::PAYMENT_REQUIRED,
                CheckoutError::Unauthorized => StatusCode::FORBIDDEN,
                CheckoutError::NotFound => StatusCode::NOT_FOUND,
                CheckoutError::Gateway(_) => StatusCode::BAD_GATEWAY,
                CheckoutError::OrderPersistenceFailed { .. } | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotAuthenticated => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn is_unexpected(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Checkout(
                    CheckoutError::Repository(_)
                        | CheckoutError::Gateway(_)
                        | CheckoutError::OrderPersistenceFailed { .. }
                )
        )
    }

    /// Client-facing message. Validation rejections are safe verbatim;
    /// everything unexpected collapses to a generic message.
    fn client_message(&self) -> String {
        match self {
            Self::Checkout(err) => match err {
                CheckoutError::OrderPersistenceFailed { .. } => {
                    // The one asymmetric case: the user has been charged.
                    "Your payment was received, but we could not record your \
                     order. Our team has been notified and will resolve it; \
                     you have not been charged twice."
                        .to_owned()
                }
                CheckoutError::Repository(_) => "Internal server error".to_owned(),
                CheckoutError::Gateway(_) => "Payment service error, please try again".to_owned(),
                other => other.to_string(),
            },
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::NotAuthenticated => "Please sign in".to_owned(),
            Self::BadRequest(msg) => format!("Bad request: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_unexpected() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        let body = Json(json!({ "error": self.client_message() }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
