use std::path::Path;

use axum::{
    body::Bytes,
    extract::{Multipart, multipart::MultipartError},
    http::StatusCode,
};

use crate::{
    error::AppError,
    utils::{TempFile, file_stem, has_extension, secure_filename, unique_name},
};

/// The `file` field of a multipart upload.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub stem: String,
    pub bytes: Bytes,
}

fn multipart_error(max_bytes: usize) -> impl Fn(MultipartError) -> AppError {
    move |e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge { max_bytes }
        } else {
            AppError::BadRequest(e.body_text())
        }
    }
}

/// Reads the `file` field, checking its name, extension and size.
pub async fn read_upload(
    multipart: &mut Multipart,
    allowed: &[&str],
    max_bytes: usize,
) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error(max_bytes))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original = field.file_name().unwrap_or_default().to_string();
        if original.trim().is_empty() {
            return Err(AppError::BadRequest("Empty filename".to_string()));
        }
        if !has_extension(&original, allowed) {
            return Err(AppError::BadRequest(format!(
                "Invalid file type. Allowed: {}",
                allowed.join(", ")
            )));
        }

        let bytes = field.bytes().await.map_err(multipart_error(max_bytes))?;
        if bytes.len() > max_bytes {
            return Err(AppError::PayloadTooLarge { max_bytes });
        }

        let filename = secure_filename(&original);
        return Ok(Upload {
            stem: file_stem(&filename),
            filename,
            bytes,
        });
    }

    Err(AppError::BadRequest("No file uploaded".to_string()))
}

/// Writes the upload under a unique name; the file goes away with the guard.
pub async fn save_upload(dir: &Path, upload: &Upload) -> Result<TempFile, AppError> {
    tokio::fs::create_dir_all(dir).await?;
    let guard = TempFile::new(dir.join(unique_name(&upload.filename)));
    tokio::fs::write(guard.path(), &upload.bytes).await?;
    tracing::info!(
        "Saved upload {} ({} bytes)",
        guard.file_name(),
        upload.bytes.len()
    );
    Ok(guard)
}
