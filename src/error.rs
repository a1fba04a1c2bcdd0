//! Error Types
//!
//! Every failure a handler can return maps to one [`AppError`] variant with a
//! fixed status code. Bodies use the `{"detail": "..."}` shape.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::domain::aggregates::{OrderError, SubscriptionError};
use crate::domain::patch::Unchanged;
use crate::domain::value_objects::{MoneyError, SlugError};
use crate::payment::PaymentError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Payment failed: {0}")]
    PaymentFailed(String),

    #[error("Storage error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: &str) -> Self { Self::NotFound(format!("{what} not found.")) }
    pub fn conflict(msg: impl Into<String>) -> Self { Self::Conflict(msg.into()) }
    pub fn credentials() -> Self { Self::Unauthorized("Could not validate credentials".into()) }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) | Self::PaymentFailed(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal server error".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                "Internal server error".to_string()
            }
            Self::PaymentFailed(reason) => reason.clone(),
            other => other.to_string(),
        };
        let body = Json(serde_json::json!({ "detail": detail }));
        if status == StatusCode::UNAUTHORIZED {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }
        (status, body).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::EmptyCart => Self::Conflict(e.to_string()),
            OrderError::Amount(e) => e.into(),
        }
    }
}

impl From<SubscriptionError> for AppError {
    fn from(e: SubscriptionError) -> Self { Self::Conflict(e.to_string()) }
}

impl From<Unchanged> for AppError {
    fn from(e: Unchanged) -> Self { Self::Unprocessable(e.to_string()) }
}

impl From<SlugError> for AppError {
    fn from(e: SlugError) -> Self { Self::Unprocessable(e.to_string()) }
}

impl From<MoneyError> for AppError {
    fn from(e: MoneyError) -> Self { Self::Unprocessable(e.to_string()) }
}

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self { Self::PaymentFailed(e.to_string()) }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self { Self::Unprocessable(e.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::from(OrderError::EmptyCart).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::from(OrderError::Amount(MoneyError::Overflow)).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::from(Unchanged).status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(AppError::PaymentFailed("card declined".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::not_found("Order").to_string(), "Order not found.");
    }

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = AppError::credentials().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }
}
