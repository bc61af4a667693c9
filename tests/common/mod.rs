#![allow(dead_code)]

use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use docvision::{
    AppState,
    config::Config,
    extraction::{PAGE_EXTRACTION_PROMPT, TABLE_EXTRACTION_PROMPT},
    gemini::{ContentGenerator, GeminiError, GenerateContentRequest, GenerateContentResponse},
    router::create_router,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object};
use tempfile::TempDir;

pub const TABLE_REPLY: &str = r#"```json
{
  "table_metadata": {"total_rows": 3, "total_columns": 2, "table_type": "printed"},
  "column_headers": ["Item", "Amount"],
  "table_data": [["Rice", 2250], ["Dal", "49.50"]],
  "extraction_notes": "clean scan"
}
```"#;

pub const EMPTY_TABLE_REPLY: &str = r#"{"column_headers": [], "table_data": []}"#;

pub const PAGE_REPLY: &str = r#"{"page_number": 1, "tables_found": 1, "tables": [
  {"table_id": 1, "headers": ["Month", "Total"], "data": [["Jan", 10], ["Feb", 12]]}
]}"#;

/// Answers by prompt: table images, PDF pages or speech.
pub struct FakeGemini {
    pub table_reply: String,
    pub page_reply: String,
    pub pcm: Vec<u8>,
    pub calls: Mutex<Vec<GenerateContentRequest>>,
}

impl FakeGemini {
    pub fn new() -> Self {
        Self {
            table_reply: TABLE_REPLY.to_string(),
            page_reply: PAGE_REPLY.to_string(),
            pcm: vec![0u8; 24_000],
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ContentGenerator for FakeGemini {
    async fn generate_content(
        &self,
        _model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        self.calls.lock().unwrap().push(request.clone());

        let wants_audio = request
            .generation_config
            .as_ref()
            .and_then(|c| c.response_modalities.as_ref())
            .is_some_and(|m| m.iter().any(|m| m == "AUDIO"));
        if wants_audio {
            return Ok(GenerateContentResponse::from_audio(&self.pcm));
        }

        match request.contents[0].parts[0].text.as_deref() {
            Some(TABLE_EXTRACTION_PROMPT) => Ok(GenerateContentResponse::from_text(&self.table_reply)),
            Some(PAGE_EXTRACTION_PROMPT) => Ok(GenerateContentResponse::from_text(&self.page_reply)),
            _ => Err(GeminiError::EmptyResponse),
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub model: Arc<FakeGemini>,
    pub dir: TempDir,
}

pub async fn app_with(model: FakeGemini, tweak: impl FnOnce(&mut Config)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::with_dirs("test-key", dir.path());
    config.extraction_retry_delay_ms = 1;
    tweak(&mut config);

    let model = Arc::new(model);
    let state = AppState::new(config, model.clone()).await.unwrap();
    TestApp {
        router: create_router(state),
        model,
        dir,
    }
}

pub async fn app() -> TestApp {
    app_with(FakeGemini::new(), |_| {}).await
}

pub fn multipart(uri: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "docvision-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(8, 6))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Minimal document with `num_pages` blank pages.
pub fn pdf_bytes(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..num_pages)
        .map(|_| {
            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
            ]);
            Object::Reference(doc.add_object(page))
        })
        .collect();

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}
