use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TABLE_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub table_model: String,
    pub tts_model: String,
    pub server_host: String,
    pub server_port: u16,
    pub upload_dir: PathBuf,
    pub output_dir: PathBuf,
    pub data_dir: PathBuf,
    pub max_image_bytes: usize,
    pub max_pdf_bytes: usize,
    pub max_pdf_pages: usize,
    pub pdf_daily_limit: u32,
    pub gemini_rpm_limit: u32,
    pub extraction_retries: u32,
    pub extraction_retry_delay_ms: u64,
    pub admin_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let gemini_api_key =
            env::var("GEMINI_API_KEY").or_else(|_| env::var("GEMINI_API_KEY_1"))?;

        Ok(Config {
            gemini_api_key,
            gemini_base_url: var_or("GEMINI_BASE_URL", DEFAULT_GEMINI_BASE_URL),
            table_model: var_or("GEMINI_TABLE_MODEL", DEFAULT_TABLE_MODEL),
            tts_model: var_or("GEMINI_TTS_MODEL", DEFAULT_TTS_MODEL),
            server_host: var_or("SERVER_HOST", "127.0.0.1"),
            server_port: parse_or("PORT", 5000),
            upload_dir: PathBuf::from(var_or("UPLOAD_DIR", "uploads")),
            output_dir: PathBuf::from(var_or("OUTPUT_DIR", "outputs")),
            data_dir: PathBuf::from(var_or("DATA_DIR", ".")),
            max_image_bytes: parse_or("MAX_IMAGE_MB", 10) * 1024 * 1024,
            max_pdf_bytes: parse_or("MAX_PDF_MB", 100) * 1024 * 1024,
            max_pdf_pages: parse_or("PDF_MAX_PAGES", 25),
            pdf_daily_limit: parse_or("PDF_DAILY_LIMIT", 100),
            gemini_rpm_limit: parse_or("GEMINI_RPM_LIMIT", 250),
            extraction_retries: parse_or("EXTRACTION_RETRIES", 3),
            extraction_retry_delay_ms: parse_or("EXTRACTION_RETRY_DELAY_MS", 1000),
            admin_token: env::var("ADMIN_TOKEN").ok().filter(|t| !t.trim().is_empty()),
        })
    }

    /// Defaults for everything except the key and the working directories.
    pub fn with_dirs(api_key: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Config {
            gemini_api_key: api_key.into(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            table_model: DEFAULT_TABLE_MODEL.to_string(),
            tts_model: DEFAULT_TTS_MODEL.to_string(),
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            upload_dir: root.join("uploads"),
            output_dir: root.join("outputs"),
            data_dir: root,
            max_image_bytes: 10 * 1024 * 1024,
            max_pdf_bytes: 100 * 1024 * 1024,
            max_pdf_pages: 25,
            pdf_daily_limit: 100,
            gemini_rpm_limit: 250,
            extraction_retries: 3,
            extraction_retry_delay_ms: 1000,
            admin_token: None,
        }
    }

    pub fn extraction_retry_delay(&self) -> Duration {
        Duration::from_millis(self.extraction_retry_delay_ms)
    }

    pub fn quota_file(&self) -> PathBuf {
        self.data_dir.join("usage_data.json")
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
