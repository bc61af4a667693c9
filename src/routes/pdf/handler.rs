use axum::{
    Json,
    extract::{Multipart, State},
    http::HeaderValue,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    excel::{self, XLSX_CONTENT_TYPE},
    pdf,
    quota::{QuotaReset, UsageInfo},
    routes::{attachment, read_upload, save_upload},
    utils::{ALLOWED_PDF_EXTENSIONS, TempFile, unique_name},
};

use super::model::{
    PAGES_FAILED_HEADER, PAGES_SUCCESSFUL_HEADER, PAGES_TOTAL_HEADER, PdfInfoResponse,
    workbook_name,
};

#[axum::debug_handler]
pub async fn pdf_info(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PdfInfoResponse>, AppError> {
    let upload = read_upload(&mut multipart, ALLOWED_PDF_EXTENSIONS, state.config.max_pdf_bytes).await?;
    let input = save_upload(&state.config.upload_dir, &upload).await?;

    let info = pdf::inspect(input.path(), state.pdf.limits()).await;
    let quota = state.quota.usage().await?;

    Ok(Json(PdfInfoResponse {
        filename: upload.filename,
        info,
        quota,
    }))
}

#[axum::debug_handler]
pub async fn pdf_to_excel(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(&mut multipart, ALLOWED_PDF_EXTENSIONS, state.config.max_pdf_bytes).await?;
    let input = save_upload(&state.config.upload_dir, &upload).await?;

    tracing::info!("Converting PDF: {}", upload.filename);
    let report = state.pdf.process_pdf(input.path()).await?;

    if !report.success {
        return Err(AppError::Internal(format!(
            "All {} pages failed to process",
            report.total_pages
        )));
    }
    if report.table_count() == 0 {
        return Err(AppError::not_found("No tables found in PDF"));
    }

    let output = TempFile::new(
        state
            .config
            .output_dir
            .join(unique_name(&workbook_name(&upload.stem))),
    );
    let summary = excel::write_pdf_pages(&report.page_results, output.path())?;
    tracing::info!(
        "PDF converted: {} pages ({} failed), {} tables, {:.1}s",
        report.total_pages,
        report.failed_pages,
        summary.total_tables,
        report.processing_time
    );

    let bytes = tokio::fs::read(output.path()).await?;
    let mut response = attachment(bytes, XLSX_CONTENT_TYPE, &workbook_name(&upload.stem));
    let headers = response.headers_mut();
    headers.insert(PAGES_TOTAL_HEADER, HeaderValue::from(report.total_pages));
    headers.insert(
        PAGES_SUCCESSFUL_HEADER,
        HeaderValue::from(report.successful_pages),
    );
    headers.insert(PAGES_FAILED_HEADER, HeaderValue::from(report.failed_pages));
    Ok(response)
}

pub async fn pdf_quota(State(state): State<AppState>) -> Result<Json<UsageInfo>, AppError> {
    Ok(Json(state.quota.usage().await?))
}

pub async fn reset_quota(State(state): State<AppState>) -> Result<Json<QuotaReset>, AppError> {
    Ok(Json(state.quota.reset().await?))
}
