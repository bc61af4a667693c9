use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::excel::ExcelError;
use crate::extraction::ExtractionError;
use crate::pdf::PdfError;
use crate::quota::{QuotaError, UsageInfo};
use crate::tts::TtsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{error}")]
    NotFound {
        error: String,
        suggestion: Option<String>,
    },

    #[error("File too large")]
    PayloadTooLarge { max_bytes: usize },

    #[error("{message}")]
    QuotaExceeded { message: String, usage: UsageInfo },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(error: impl Into<String>) -> Self {
        AppError::NotFound {
            error: error.into(),
            suggestion: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    code: u16,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quota: Option<UsageInfo>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = ErrorResponse {
            code: status.as_u16(),
            error: String::new(),
            message: None,
            suggestion: None,
            max_size: None,
            quota: None,
        };

        match self {
            AppError::BadRequest(error) => body.error = error,
            AppError::NotFound { error, suggestion } => {
                body.error = error;
                body.suggestion = suggestion;
            }
            AppError::PayloadTooLarge { max_bytes } => {
                body.error = "File too large".to_string();
                body.max_size = Some(format!("{}MB", max_bytes / (1024 * 1024)));
            }
            AppError::QuotaExceeded { message, usage } => {
                body.error = message;
                body.quota = Some(usage);
            }
            AppError::Unauthorized => body.error = "Unauthorized".to_string(),
            AppError::Internal(message) => {
                body.error = "Internal server error".to_string();
                body.message = Some(message);
            }
        }

        (status, Json(body)).into_response()
    }
}

impl From<ExtractionError> for AppError {
    fn from(e: ExtractionError) -> Self {
        match e {
            ExtractionError::InvalidImage(_) | ExtractionError::Blocked(_) => {
                AppError::BadRequest(e.to_string())
            }
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<PdfError> for AppError {
    fn from(e: PdfError) -> Self {
        if e.is_invalid_input() {
            AppError::BadRequest(e.to_string())
        } else {
            AppError::Internal(e.to_string())
        }
    }
}

impl From<ExcelError> for AppError {
    fn from(e: ExcelError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<QuotaError> for AppError {
    fn from(e: QuotaError) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl From<TtsError> for AppError {
    fn from(e: TtsError) -> Self {
        if e.is_invalid_input() {
            AppError::BadRequest(e.to_string())
        } else {
            AppError::Internal(e.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// Failures while building [`crate::AppState`].
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to prepare directories: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Quota(#[from] QuotaError),
}
