use std::sync::Arc;

use config::Config;
use extraction::TableExtractor;
use gemini::{ContentGenerator, RequestRateLimiter};
use pdf::{PdfLimits, PdfTableConverter};
use quota::DailyQuota;
use tts::TtsService;

pub mod config;
pub mod error;
pub mod excel;
pub mod extraction;
pub mod gemini;
pub mod middleware;
pub mod pdf;
pub mod quota;
pub mod router;
pub mod routes;
pub mod table;
pub mod tts;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub extractor: Arc<TableExtractor>,
    pub pdf: Arc<PdfTableConverter>,
    pub tts: Arc<TtsService>,
    pub quota: Arc<DailyQuota>,
}

impl AppState {
    /// Creates the working directories, loads the usage counter and wires
    /// every service to the same model client.
    pub async fn new(
        config: Config,
        generator: Arc<dyn ContentGenerator>,
    ) -> Result<Self, error::StartupError> {
        for dir in [&config.upload_dir, &config.output_dir, &config.data_dir] {
            tokio::fs::create_dir_all(dir).await?;
        }

        let quota = DailyQuota::load(config.quota_file(), config.pdf_daily_limit).await?;
        let extractor = TableExtractor::new(
            generator.clone(),
            config.table_model.clone(),
            config.extraction_retries,
            config.extraction_retry_delay(),
        );
        let pdf = PdfTableConverter::new(
            generator.clone(),
            config.table_model.clone(),
            PdfLimits {
                max_pages: config.max_pdf_pages,
                max_bytes: config.max_pdf_bytes,
            },
            Arc::new(RequestRateLimiter::per_minute(config.gemini_rpm_limit)),
        );
        let tts = TtsService::new(generator, config.tts_model.clone(), config.output_dir.clone());

        Ok(Self {
            config: Arc::new(config),
            extractor: Arc::new(extractor),
            pdf: Arc::new(pdf),
            tts: Arc::new(tts),
            quota: Arc::new(quota),
        })
    }
}
