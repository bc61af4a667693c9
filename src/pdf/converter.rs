use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{PdfError, PdfLimits, PdfPage, read_pdf, split_pages, validate};
use crate::extraction::{PAGE_EXTRACTION_PROMPT, parse_page_reply, preview, table_generation_config};
use crate::gemini::{
    ContentGenerator, GeminiError, GenerateContentRequest, Part, RequestRateLimiter,
};
use crate::table::ExtractedTable;

/// Upper bound on concurrent page calls.
pub const MAX_WORKERS: usize = 25;

#[derive(Debug, Clone, Serialize)]
pub struct PageResult {
    pub page_number: u32,
    pub success: bool,
    pub tables: Vec<ExtractedTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables_found: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub extraction_notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PageResult {
    fn failed(page_number: u32, error: impl Into<String>) -> Self {
        Self {
            page_number,
            success: false,
            tables: Vec::new(),
            tables_found: None,
            extraction_notes: String::new(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PdfReport {
    pub success: bool,
    pub page_results: Vec<PageResult>,
    pub total_pages: usize,
    pub successful_pages: usize,
    pub failed_pages: usize,
    pub processing_time: f64,
}

impl PdfReport {
    pub fn table_count(&self) -> usize {
        self.page_results
            .iter()
            .flat_map(|p| &p.tables)
            .filter(|t| !t.is_empty())
            .count()
    }
}

pub struct PdfTableConverter {
    generator: Arc<dyn ContentGenerator>,
    model: String,
    limits: PdfLimits,
    rate_limiter: Arc<RequestRateLimiter>,
}

impl PdfTableConverter {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        model: impl Into<String>,
        limits: PdfLimits,
        rate_limiter: Arc<RequestRateLimiter>,
    ) -> Self {
        let model = model.into();
        tracing::info!(
            "PDF-to-Excel converter initialized ({}), max pages: {}",
            model,
            limits.max_pages
        );
        Self {
            generator,
            model,
            limits,
            rate_limiter,
        }
    }

    pub fn limits(&self) -> PdfLimits {
        self.limits
    }

    /// Validates, splits and extracts every page concurrently.
    ///
    /// Page-level failures are recorded on the page; only problems with the
    /// document itself are returned as errors.
    pub async fn process_pdf(&self, pdf_path: &Path) -> Result<PdfReport, PdfError> {
        let start = Instant::now();

        let bytes = read_pdf(pdf_path).await?;
        validate(&bytes, self.limits)?;

        let pages = tokio::task::spawn_blocking(move || split_pages(&bytes))
            .await
            .map_err(|e| PdfError::Parse(e.to_string()))??;
        let total_pages = pages.len();
        let workers = total_pages.clamp(1, MAX_WORKERS);
        tracing::info!(
            "Processing PDF: {} pages with {} workers",
            total_pages,
            workers
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        for page in pages {
            let semaphore = semaphore.clone();
            let generator = self.generator.clone();
            let limiter = self.rate_limiter.clone();
            let model = self.model.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                limiter.acquire().await;
                extract_page(generator.as_ref(), &model, page).await
            });
        }

        let mut page_results = Vec::with_capacity(total_pages);
        let mut task_failure = None;
        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            completed += 1;
            match joined {
                Ok(result) => {
                    if result.success {
                        tracing::info!(
                            "Page {}/{} completed ({}/{} done)",
                            result.page_number,
                            total_pages,
                            completed,
                            total_pages
                        );
                    } else {
                        tracing::warn!(
                            "Page {} failed: {}",
                            result.page_number,
                            result.error.as_deref().unwrap_or("Unknown error")
                        );
                    }
                    page_results.push(result);
                }
                Err(e) => {
                    tracing::error!("Page task execution error: {}", e);
                    task_failure = Some(e.to_string());
                }
            }
        }

        // a panicked task never reports its page number
        for number in 1..=total_pages as u32 {
            if !page_results.iter().any(|r| r.page_number == number) {
                let reason = task_failure.as_deref().unwrap_or("task did not complete");
                page_results.push(PageResult::failed(
                    number,
                    format!("Execution failed: {reason}"),
                ));
            }
        }
        page_results.sort_by_key(|r| r.page_number);

        let successful_pages = page_results.iter().filter(|r| r.success).count();
        let failed_pages = total_pages - successful_pages;
        let processing_time = start.elapsed().as_secs_f64();

        tracing::info!(
            "PDF processing complete: {} pages, {} successful, {} failed, {:.2}s",
            total_pages,
            successful_pages,
            failed_pages,
            processing_time
        );

        Ok(PdfReport {
            success: successful_pages > 0,
            page_results,
            total_pages,
            successful_pages,
            failed_pages,
            processing_time,
        })
    }
}

async fn extract_page(generator: &dyn ContentGenerator, model: &str, page: PdfPage) -> PageResult {
    let number = page.number;
    tracing::info!("Processing page {} with Gemini...", number);

    let request = GenerateContentRequest::user(
        vec![
            Part::text(PAGE_EXTRACTION_PROMPT),
            Part::inline("application/pdf", &page.bytes),
        ],
        table_generation_config(),
    );

    let reply = match generator
        .generate_content(model, &request)
        .await
        .and_then(|r| r.text())
    {
        Ok(reply) => reply,
        Err(GeminiError::Blocked(reason)) => {
            tracing::warn!("Page {} blocked: {}", number, reason);
            return PageResult::failed(number, "Content filtered by Gemini safety settings");
        }
        Err(e) => {
            tracing::error!("Page {} extraction error: {}", number, e);
            return PageResult::failed(number, format!("Extraction failed: {e}"));
        }
    };

    match parse_page_reply(&reply) {
        Ok(parsed) => {
            tracing::info!("Page {}: {} table(s) extracted", number, parsed.tables.len());
            PageResult {
                page_number: number,
                success: true,
                tables_found: Some(parsed.tables_found.unwrap_or(parsed.tables.len() as u32)),
                tables: parsed.tables,
                extraction_notes: parsed.extraction_notes,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!("Page {} JSON parse error: {}", number, e);
            tracing::error!("Raw response (first 300 chars): {}", preview(&reply, 300));
            PageResult::failed(number, format!("Failed to parse Gemini response: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GenerateContentResponse;
    use crate::pdf::test_support::{page_marker, sample_pdf};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers per page; pages listed in `broken` get an unparseable reply.
    struct PageAwareModel {
        broken: Vec<u32>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl PageAwareModel {
        fn new(broken: Vec<u32>) -> Arc<Self> {
            Arc::new(Self {
                broken,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ContentGenerator for PageAwareModel {
        async fn generate_content(
            &self,
            _model: &str,
            request: &GenerateContentRequest,
        ) -> Result<GenerateContentResponse, GeminiError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let blob = request.contents[0].parts[1].inline_data.as_ref().unwrap();
            assert_eq!(blob.mime_type, "application/pdf");
            let page = page_marker(&blob.decode().unwrap());

            // later pages answer first
            tokio::time::sleep(Duration::from_millis(50 - page as u64 * 5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.broken.contains(&page) {
                return Ok(GenerateContentResponse::from_text("sorry, no JSON today"));
            }
            Ok(GenerateContentResponse::from_text(format!(
                r#"```json
{{"page_number": {page}, "tables_found": 1, "tables": [
  {{"table_id": 1, "headers": ["Page"], "data": [["{page}"]]}}
]}}
```"#
            )))
        }
    }

    fn converter(model: Arc<dyn ContentGenerator>, max_pages: usize) -> PdfTableConverter {
        PdfTableConverter::new(
            model,
            "gemini-2.5-flash",
            PdfLimits {
                max_pages,
                max_bytes: 100 * 1024 * 1024,
            },
            Arc::new(RequestRateLimiter::per_minute(250)),
        )
    }

    fn write_pdf(dir: &Path, pages: u32) -> std::path::PathBuf {
        let path = dir.join("report.pdf");
        std::fs::write(&path, sample_pdf(pages)).unwrap();
        path
    }

    #[tokio::test]
    async fn results_come_back_sorted_by_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(dir.path(), 5);
        let model = PageAwareModel::new(vec![]);

        let report = converter(model.clone(), 25).process_pdf(&path).await.unwrap();

        assert!(report.success);
        assert_eq!(report.total_pages, 5);
        assert_eq!(report.successful_pages, 5);
        assert_eq!(report.failed_pages, 0);
        assert_eq!(report.table_count(), 5);
        let numbers: Vec<u32> = report.page_results.iter().map(|r| r.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        for result in &report.page_results {
            assert_eq!(
                result.tables[0].data[0][0].as_text(),
                result.page_number.to_string()
            );
        }
        assert!(model.peak.load(Ordering::SeqCst) > 1);
    }

    #[tokio::test]
    async fn failed_pages_do_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(dir.path(), 3);

        let report = converter(PageAwareModel::new(vec![2]), 25)
            .process_pdf(&path)
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.successful_pages, 2);
        assert_eq!(report.failed_pages, 1);
        let failed = &report.page_results[1];
        assert_eq!(failed.page_number, 2);
        assert!(!failed.success);
        assert!(failed.error.as_deref().unwrap().starts_with("Failed to parse Gemini response"));
    }

    #[tokio::test]
    async fn all_pages_failing_is_unsuccessful() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(dir.path(), 2);

        let report = converter(PageAwareModel::new(vec![1, 2]), 25)
            .process_pdf(&path)
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(report.failed_pages, 2);
        assert_eq!(report.table_count(), 0);
    }

    #[tokio::test]
    async fn page_limit_is_enforced_before_any_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(dir.path(), 3);
        let model = PageAwareModel::new(vec![]);

        let err = converter(model.clone(), 2)
            .process_pdf(&path)
            .await
            .unwrap_err();

        assert!(matches!(err, PdfError::TooManyPages { pages: 3, max: 2 }));
        assert_eq!(model.peak.load(Ordering::SeqCst), 0);
    }
}
