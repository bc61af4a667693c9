//! Multi-page PDF handling: validation, page splitting and the per-page
//! table extraction fan-out.

mod converter;

use std::path::{Path, PathBuf};

use lopdf::Document;
use serde::Serialize;
use thiserror::Error;

pub use converter::{MAX_WORKERS, PageResult, PdfReport, PdfTableConverter};

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF file not found: {0}")]
    NotFound(PathBuf),

    #[error("PDF file too large: {size_mb:.1}MB (max: {max_mb}MB)")]
    TooLarge { size_mb: f64, max_mb: usize },

    #[error("PDF has {pages} pages. Maximum allowed: {max} pages.")]
    TooManyPages { pages: usize, max: usize },

    #[error("PDF appears to be empty (0 pages)")]
    Empty,

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Failed to extract page {page}: {message}")]
    Split { page: u32, message: String },

    #[error("PDF processing failed: {0}")]
    Io(#[from] std::io::Error),
}

impl PdfError {
    /// Whether the upload itself is at fault.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            PdfError::TooLarge { .. } | PdfError::TooManyPages { .. } | PdfError::Empty | PdfError::Parse(_)
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PdfLimits {
    pub max_pages: usize,
    pub max_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfInfo {
    pub valid: bool,
    pub page_count: usize,
    pub file_size: u64,
    pub max_pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One page re-saved as a standalone document.
#[derive(Debug, Clone)]
pub struct PdfPage {
    pub number: u32,
    pub bytes: Vec<u8>,
}

fn load(bytes: &[u8]) -> Result<Document, PdfError> {
    Document::load_mem(bytes).map_err(|e| PdfError::Parse(e.to_string()))
}

pub fn page_count(bytes: &[u8]) -> Result<usize, PdfError> {
    Ok(load(bytes)?.get_pages().len())
}

/// Returns the page count when the document is within limits.
pub fn validate(bytes: &[u8], limits: PdfLimits) -> Result<usize, PdfError> {
    if bytes.len() > limits.max_bytes {
        return Err(PdfError::TooLarge {
            size_mb: bytes.len() as f64 / (1024.0 * 1024.0),
            max_mb: limits.max_bytes / (1024 * 1024),
        });
    }

    let pages = page_count(bytes)?;
    if pages > limits.max_pages {
        return Err(PdfError::TooManyPages {
            pages,
            max: limits.max_pages,
        });
    }
    if pages == 0 {
        return Err(PdfError::Empty);
    }

    tracing::info!(
        "PDF validated: {} pages, {:.1}KB",
        pages,
        bytes.len() as f64 / 1024.0
    );
    Ok(pages)
}

pub async fn read_pdf(path: &Path) -> Result<Vec<u8>, PdfError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(PdfError::NotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Never fails; problems are reported in `error`.
pub async fn inspect(path: &Path, limits: PdfLimits) -> PdfInfo {
    let mut info = PdfInfo {
        valid: false,
        page_count: 0,
        file_size: 0,
        max_pages: limits.max_pages,
        error: None,
    };

    let bytes = match read_pdf(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            info.error = Some(e.to_string());
            return info;
        }
    };
    info.file_size = bytes.len() as u64;

    match validate(&bytes, limits) {
        Ok(pages) => {
            info.valid = true;
            info.page_count = pages;
        }
        Err(e) => {
            if let PdfError::TooManyPages { pages, .. } = e {
                info.page_count = pages;
            }
            tracing::warn!("PDF validation failed: {}", e);
            info.error = Some(e.to_string());
        }
    }
    info
}

/// Splits a document into single-page documents numbered from 1.
pub fn split_pages(bytes: &[u8]) -> Result<Vec<PdfPage>, PdfError> {
    let doc = load(bytes)?;
    let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

    let mut pages = Vec::with_capacity(numbers.len());
    for &number in &numbers {
        let mut single = doc.clone();
        let others: Vec<u32> = numbers.iter().copied().filter(|&n| n != number).collect();
        if !others.is_empty() {
            single.delete_pages(&others);
        }
        single.prune_objects();
        single.compress();

        let mut buffer = Vec::new();
        single.save_to(&mut buffer).map_err(|e| PdfError::Split {
            page: number,
            message: e.to_string(),
        })?;
        pages.push(PdfPage {
            number,
            bytes: buffer,
        });
    }

    tracing::info!("Extracted {} pages as single-page documents", pages.len());
    Ok(pages)
}
