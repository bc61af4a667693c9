use axum::{
    Json,
    extract::{Multipart, State},
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    excel::{self, XLSX_CONTENT_TYPE},
    extraction::{ExtractionError, ExtractionResult},
    routes::{attachment, read_upload, save_upload},
    utils::{ALLOWED_IMAGE_EXTENSIONS, TempFile, unique_name},
};

use super::model::{NO_TABLES_SUGGESTION, workbook_name};

/// Upload problems are returned as `Err`; extraction outcomes are left to the caller.
async fn extract_upload(
    state: &AppState,
    multipart: &mut Multipart,
) -> Result<(String, Result<ExtractionResult, ExtractionError>), AppError> {
    let upload = read_upload(multipart, ALLOWED_IMAGE_EXTENSIONS, state.config.max_image_bytes).await?;
    let input = save_upload(&state.config.upload_dir, &upload).await?;

    tracing::info!("Processing file: {}", upload.filename);
    let result = state.extractor.extract_tables(input.path()).await;
    Ok((upload.stem, result))
}

#[axum::debug_handler]
pub async fn extract_table(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let (stem, result) = extract_upload(&state, &mut multipart).await?;
    let result = result?;

    if !result.has_tables() {
        tracing::warn!("No tables detected in {}", stem);
        return Err(AppError::NotFound {
            error: "No tables detected in image".to_string(),
            suggestion: Some(NO_TABLES_SUGGESTION.to_string()),
        });
    }
    tracing::info!("Detected {} table(s)", result.tables.len());

    let output = TempFile::new(
        state
            .config
            .output_dir
            .join(unique_name(&workbook_name(&stem))),
    );
    let summary = excel::write_tables(&result.tables, output.path())?;
    tracing::info!(
        "Excel file created: {} ({} bytes)",
        output.file_name(),
        summary.file_size
    );

    let bytes = tokio::fs::read(output.path()).await?;
    Ok(attachment(bytes, XLSX_CONTENT_TYPE, &workbook_name(&stem)))
}

#[axum::debug_handler]
pub async fn extract_table_json(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResult>, AppError> {
    let (stem, result) = extract_upload(&state, &mut multipart).await?;
    Ok(Json(result.unwrap_or_else(|e| {
        tracing::error!("Extraction failed for {}: {}", stem, e);
        ExtractionResult::failed(&e, state.extractor.model())
    })))
}
