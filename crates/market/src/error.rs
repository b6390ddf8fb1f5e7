//! Application-level error type and its HTTP mapping.
//!
//! Domain errors from the stores and services convert into [`AppError`]
//! via `?`; the `IntoResponse` impl is the single place where an error
//! becomes a status code and a `{"message": ...}` body. Internal detail
//! never leaks to the client — 5xx responses log the cause and return a
//! generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::services::CheckoutError;
use crate::store::{CartError, LedgerError};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Cart(err) => match err {
                CartError::AlreadyInCart => {
                    (StatusCode::CONFLICT, "ALREADY_IN_CART".to_owned())
                }
                CartError::LineNotFound => {
                    (StatusCode::NOT_FOUND, "Item not found".to_owned())
                }
                CartError::InvalidQuantity => {
                    (StatusCode::BAD_REQUEST, "Quantity must be >= 1".to_owned())
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => {
                    (StatusCode::BAD_REQUEST, "No items in cart".to_owned())
                }
                CheckoutError::MissingProof => (
                    StatusCode::BAD_REQUEST,
                    "Transaction hash required".to_owned(),
                ),
                CheckoutError::PendingConfirmation => (
                    StatusCode::CONFLICT,
                    "Transaction not yet confirmed".to_owned(),
                ),
                CheckoutError::Rate(_) => (
                    StatusCode::BAD_GATEWAY,
                    "Rate oracle unavailable".to_owned(),
                ),
                CheckoutError::Chain(_) => (
                    StatusCode::BAD_GATEWAY,
                    "Chain provider unavailable".to_owned(),
                ),
                CheckoutError::AmountOverflow | CheckoutError::Ledger(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_owned(),
                ),
            },
            Self::Ledger(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_owned(),
            ),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            Self::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message.clone()),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else if status == StatusCode::BAD_GATEWAY {
            tracing::warn!(error = %self, "upstream dependency failed");
        }

        (status, Json(ErrorBody { message })).into_response()
    }
}
