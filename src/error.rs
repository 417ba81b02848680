//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;
use crate::jobs::JobError;
use crate::repository::RepositoryError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Missing required header: {0}")]
    MissingHeader(String),

    #[error("Permission denied")]
    PermissionDenied,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Job(#[from] JobError),

    // Server errors (5xx)
    #[error("Not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Domain(err.into())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

fn domain_status(err: &DomainError) -> (StatusCode, &'static str, Option<String>) {
    match err {
        // 404 Not Found
        DomainError::CardNotFound => (StatusCode::NOT_FOUND, "card_not_found", None),
        DomainError::AccountNotFound(iban) => {
            (StatusCode::NOT_FOUND, "account_not_found", Some(iban.clone()))
        }
        DomainError::ExchangeRateNotFound { .. } => {
            (StatusCode::NOT_FOUND, "exchange_rate_not_found", Some(err.to_string()))
        }

        // 403 Forbidden
        DomainError::OwnershipViolation => (StatusCode::FORBIDDEN, "ownership_violation", None),

        // 422 Unprocessable Entity
        DomainError::CardExpired => (StatusCode::UNPROCESSABLE_ENTITY, "card_expired", None),
        DomainError::SameAccountTransfer => {
            (StatusCode::UNPROCESSABLE_ENTITY, "same_account_transfer", None)
        }
        DomainError::VelocityLimitExceeded { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "velocity_limit_exceeded",
            Some(err.to_string()),
        ),
        DomainError::InsufficientBalance { .. } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_balance",
            Some(err.to_string()),
        ),

        // 400 Bad Request
        DomainError::InvalidAmount(msg) => {
            (StatusCode::BAD_REQUEST, "invalid_amount", Some(msg.clone()))
        }

        // 500, details stay in the log
        DomainError::CorruptExchangeRate { .. } => {
            tracing::error!("{}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_exchange_rate", None)
        }
        DomainError::PersistenceFailure(msg) => {
            tracing::error!("Persistence failure: {}", msg);
            (StatusCode::INTERNAL_SERVER_ERROR, "persistence_failure", None)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }
            AppError::MissingHeader(header) => {
                (StatusCode::BAD_REQUEST, "missing_header", Some(header.clone()))
            }

            // 403 Forbidden
            AppError::PermissionDenied => (StatusCode::FORBIDDEN, "permission_denied", None),

            AppError::Domain(domain_err) => domain_status(domain_err),

            // Rate source trouble is an upstream failure
            AppError::Job(JobError::Http(e)) => {
                tracing::error!("Rate source error: {:?}", e);
                (StatusCode::BAD_GATEWAY, "rate_source_unavailable", None)
            }
            AppError::Job(JobError::Feed(msg)) => {
                (StatusCode::BAD_GATEWAY, "rate_source_rejected", Some(msg.clone()))
            }
            AppError::Job(JobError::Database(e)) => {
                tracing::error!("Rate refresh database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }

            // 503 Service Unavailable
            AppError::NotConfigured(setting) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_configured",
                Some(setting.to_string()),
            ),

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        // Server-side failures never echo internals to the caller
        let error = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
