use std::io::Error as IoError;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub mod client;
pub mod config;
pub mod registry;

pub use client::{ClientError, LogSinkError};
pub use config::ConfigError;
pub use registry::RegistryError;

use crate::models::{EntryErrorKind, EntryErrors, EntryField};

#[derive(Debug, Error)]
pub enum AppError {
    // Service-level domain errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict error: {0}")]
    Conflict(String),
    #[error("Not found error: {0}")]
    NotFound(String),
    #[error("Gone error: {0}")]
    Gone(String),
    #[error("Internal error: {0}")]
    Internal(String),
    // Infrastructure/system errors
    #[error("Server error: {0}")]
    Server(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Logger error: {0}")]
    Logger(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<LogSinkError> for AppError {
    fn from(e: LogSinkError) -> Self {
        AppError::Logger(e.to_string())
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateShortcode(_) => AppError::Conflict(err.to_string()),
            RegistryError::NotFound(_) => AppError::NotFound(err.to_string()),
            RegistryError::Expired(_) => AppError::Gone(err.to_string()),
            RegistryError::ShortcodeSpaceExhausted { .. } => AppError::Internal(err.to_string()),
        }
    }
}

impl From<EntryErrors> for AppError {
    fn from(errors: EntryErrors) -> Self {
        // A taken shortcode is the only field error that is a conflict
        if errors.len() == 1
            && errors.kind(EntryField::Shortcode) == Some(EntryErrorKind::DuplicateShortcode)
        {
            return AppError::Conflict(errors.to_string());
        }
        AppError::Validation(errors.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::Internal(_)
            | AppError::Server(_)
            | AppError::Config(_)
            | AppError::Logger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_string = self.to_string();
        let (error_type, message) = error_string
            .split_once(':')
            .map(|(t, m)| (t.trim(), m.trim()))
            .unwrap_or(("Error", "An error occurred"));

        let error_message = if message.is_empty() {
            "An error occurred"
        } else {
            message
        };

        let code = self.status_code().as_u16();
        HttpResponse::build(self.status_code()).json(json!({
            "type": error_type.to_uppercase(),
            "message": error_message,
            "status_code": code,
        }))
    }
}
