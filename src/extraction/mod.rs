//! Table extraction from a single uploaded image.

mod parse;
mod prompt;

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gemini::{ContentGenerator, GeminiError, GenerateContentRequest, Part};
use crate::table::ExtractedTable;

pub use parse::{PageReply, extract_json_block, parse_page_reply, parse_table_reply};
pub use prompt::{PAGE_EXTRACTION_PROMPT, TABLE_EXTRACTION_PROMPT, table_generation_config};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Image file not found: {0}")]
    NotFound(PathBuf),

    #[error("Invalid or corrupted image file: {0}")]
    InvalidImage(String),

    #[error("failed to read upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content filtered by Gemini safety settings ({0})")]
    Blocked(String),

    #[error("Failed to parse Gemini response after {attempts} attempts: {message}")]
    Unparseable { attempts: u32, message: String },

    #[error("Extraction failed after {attempts} attempts: {source}")]
    Model { attempts: u32, source: GeminiError },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub tables: Vec<ExtractedTable>,
    pub extraction_method: String,
    pub total_tables: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    /// Result body for an extraction that did not produce tables.
    pub fn failed(error: &ExtractionError, extraction_method: impl Into<String>) -> Self {
        Self {
            success: false,
            tables: Vec::new(),
            extraction_method: extraction_method.into(),
            total_tables: 0,
            error: Some(error.to_string()),
        }
    }

    pub fn has_tables(&self) -> bool {
        self.tables.iter().any(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub mime_type: String,
}

/// Checks that the bytes are an image we can name a MIME type for.
pub fn inspect_image(bytes: &[u8]) -> Result<ImageInfo, ExtractionError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ExtractionError::InvalidImage(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| ExtractionError::InvalidImage("unrecognised image format".to_string()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ExtractionError::InvalidImage(e.to_string()))?;

    Ok(ImageInfo {
        width,
        height,
        format: format!("{format:?}"),
        mime_type: format.to_mime_type().to_string(),
    })
}

pub struct TableExtractor {
    generator: Arc<dyn ContentGenerator>,
    model: String,
    max_attempts: u32,
    retry_delay: Duration,
}

impl TableExtractor {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        model: impl Into<String>,
        max_attempts: u32,
        retry_delay: Duration,
    ) -> Self {
        let model = model.into();
        tracing::info!("Table extractor initialized ({})", model);
        Self {
            generator,
            model,
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn extract_tables(
        &self,
        image_path: &Path,
    ) -> Result<ExtractionResult, ExtractionError> {
        let bytes = match tokio::fs::read(image_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExtractionError::NotFound(image_path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        let image = inspect_image(&bytes)?;
        tracing::info!(
            "Image loaded: {}x{} pixels, format: {}",
            image.width,
            image.height,
            image.format
        );

        let request = GenerateContentRequest::user(
            vec![
                Part::text(TABLE_EXTRACTION_PROMPT),
                Part::inline(image.mime_type, &bytes),
            ],
            table_generation_config(),
        );

        let mut attempt = 0;
        loop {
            attempt += 1;
            tracing::info!(
                "Processing image: {} (attempt {}/{})",
                image_path.display(),
                attempt,
                self.max_attempts
            );

            let reply = match self
                .generator
                .generate_content(&self.model, &request)
                .await
                .and_then(|r| r.text())
            {
                Ok(reply) => reply,
                Err(GeminiError::Blocked(reason)) => {
                    tracing::warn!("Response blocked: {}", reason);
                    return Err(ExtractionError::Blocked(reason));
                }
                Err(e) => {
                    tracing::error!("Extraction error (attempt {}): {}", attempt, e);
                    if attempt >= self.max_attempts {
                        return Err(ExtractionError::Model {
                            attempts: attempt,
                            source: e,
                        });
                    }
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            match parse_table_reply(&reply) {
                Ok(table) => {
                    log_summary(&table);
                    return Ok(ExtractionResult {
                        success: true,
                        tables: vec![table],
                        extraction_method: self.model.clone(),
                        total_tables: 1,
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::error!("JSON parse error (attempt {}): {}", attempt, e);
                    tracing::error!("Raw response (first 500 chars): {}", preview(&reply, 500));
                    if attempt >= self.max_attempts {
                        save_debug_reply(image_path, attempt, &e, &reply).await;
                        return Err(ExtractionError::Unparseable {
                            attempts: attempt,
                            message: e.to_string(),
                        });
                    }
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }
}

fn log_summary(table: &ExtractedTable) {
    let rows = table
        .metadata
        .get("total_rows")
        .and_then(|v| v.as_u64())
        .unwrap_or(table.row_count() as u64);
    let cols = table
        .metadata
        .get("total_columns")
        .and_then(|v| v.as_u64())
        .unwrap_or(table.column_count() as u64);
    tracing::info!("Extracted: {} rows x {} columns", rows, cols);
    tracing::info!("Table type: {}", table.metadata_str("table_type"));
    tracing::info!("Confidence: {}", table.metadata_str("extraction_confidence"));
    tracing::info!("Image quality: {}", table.metadata_str("image_quality"));
    if let Some(languages) = table
        .metadata
        .get("detected_languages")
        .and_then(|v| v.as_array())
    {
        let names: Vec<&str> = languages.iter().filter_map(|l| l.as_str()).collect();
        if !names.is_empty() {
            tracing::info!("Languages: {}", names.join(", "));
        }
    }
}

pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

async fn save_debug_reply(image_path: &Path, attempt: u32, err: &serde_json::Error, reply: &str) {
    let name = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let debug_path = image_path.with_file_name(format!("gemini_debug_{name}.txt"));
    let contents = format!(
        "Image: {}\nAttempt: {}\nError: {}\n\nRaw Response:\n{}",
        image_path.display(),
        attempt,
        err,
        reply
    );
    match tokio::fs::write(&debug_path, contents).await {
        Ok(()) => tracing::info!("Debug info saved to: {}", debug_path.display()),
        Err(e) => tracing::warn!("Could not save debug info: {}", e),
    }
}
