//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// The four failure kinds surfaced by the record layer. Messages are optional.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("data invalid{}", suffix(.0))]
    DataInvalid(Option<String>),
    #[error("not found{}", suffix(.0))]
    NotFound(Option<String>),
    #[error("already exists{}", suffix(.0))]
    AlreadyExists(Option<String>),
    #[error("internal error{}", suffix(.0))]
    Internal(Option<String>),
}

fn suffix(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default()
}

impl AppError {
    pub fn data_invalid(message: impl Into<String>) -> Self {
        AppError::DataInvalid(Some(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(Some(message.into()))
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        AppError::AlreadyExists(Some(message.into()))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(Some(message.into()))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DataInvalid(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::DataInvalid(_) => "data_invalid",
            AppError::NotFound(_) => "not_found",
            AppError::AlreadyExists(_) => "already_exists",
            AppError::Internal(_) => "internal_error",
        }
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
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
