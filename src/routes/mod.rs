mod health;
pub mod pdf;
pub mod table;
pub mod tts;
mod upload;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::AppError;

pub use health::health;
pub use upload::{Upload, read_upload, save_upload};

pub async fn not_found() -> AppError {
    AppError::not_found("Endpoint not found")
}

/// Wraps file bytes as a download with the given name.
pub(crate) fn attachment(bytes: Vec<u8>, content_type: &'static str, filename: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}
