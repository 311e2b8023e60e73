//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures raised by class descriptors: construction (class shape) and by-name access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReflectError {
    #[error("no such field: {class}.{field}")]
    NoSuchField { class: &'static str, field: String },
    #[error("type mismatch on {class}.{field}: declared {declared}, requested {requested}")]
    TypeMismatch {
        class: &'static str,
        field: String,
        declared: &'static str,
        requested: &'static str,
    },
    #[error("duplicate field: {class}.{field}")]
    DuplicateField { class: &'static str, field: String },
    #[error("cannot convert {class}.{field}: {message}")]
    Conversion {
        class: &'static str,
        field: String,
        message: String,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {key}: {message}")]
    Env { key: &'static str, message: String },
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("validation: {0}")]
    Validation(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reflect(#[from] ReflectError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("value required: {0}")]
    ValueRequired(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Business-level failures the caller can act on, as opposed to internal ones.
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::ValueRequired(_)
                | AppError::Validation(_)
                | AppError::Conflict(_)
                | AppError::BadRequest(_)
        )
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Reflect(ReflectError::NoSuchField { .. }) => (StatusCode::BAD_REQUEST, "unknown_field"),
            AppError::Reflect(_) => (StatusCode::INTERNAL_SERVER_ERROR, "descriptor_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::ValueRequired(_) => (StatusCode::UNPROCESSABLE_ENTITY, "value_required"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
