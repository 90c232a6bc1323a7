// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested duration does not fit in the day's 1440-minute budget.
    ///
    /// `remaining` is the exact number of minutes the caller could still
    /// log. It is signed: an external writer that bypassed validation can
    /// push a day over budget, leaving remaining negative.
    #[error("Cannot log {requested} minutes: only {remaining} minutes remaining for this day")]
    BudgetExceeded { requested: u64, remaining: i64 },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Live subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_minutes: Option<i64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details, remaining) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None, None),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", None, None),
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_input",
                Some(msg.clone()),
                None,
            ),
            AppError::BudgetExceeded { remaining, .. } => (
                StatusCode::CONFLICT,
                "budget_exceeded",
                Some(self.to_string()),
                Some(*remaining),
            ),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, "not_found", Some(msg.clone()), None)
            }
            AppError::PersistenceFailed(msg) => {
                tracing::error!(error = %msg, "Persistence failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "persistence_failed",
                    Some(msg.clone()),
                    None,
                )
            }
            AppError::SubscriptionFailed(msg) => {
                tracing::warn!(error = %msg, "Subscription failure");
                (
                    StatusCode::BAD_GATEWAY,
                    "subscription_failed",
                    Some(msg.clone()),
                    None,
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    None,
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
            remaining_minutes: remaining,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
