mod common;

use std::io::Cursor;

use axum::http::{StatusCode, header};
use calamine::{Data, Reader, Xlsx, open_workbook_from_rs};
use serde_json::json;
use tower::ServiceExt;

use common::*;

fn workbook(bytes: Vec<u8>) -> Xlsx<Cursor<Vec<u8>>> {
    open_workbook_from_rs(Cursor::new(bytes)).unwrap()
}

fn files_in(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[tokio::test]
async fn health_reports_model() {
    let app = app().await;
    let response = app.router.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["extraction_method"], "gemini-2.5-flash");
}

#[tokio::test]
async fn unknown_path_is_json_404() {
    let app = app().await;
    let response = app.router.oneshot(get("/api/nope")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Endpoint not found");
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn image_becomes_workbook() {
    let app = app().await;
    let request = multipart("/api/extract-table", "scan.png", "image/png", &png_bytes());
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"table_extracted_scan.xlsx\""
    );
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );

    let mut book = workbook(body_bytes(response).await);
    let range = book.worksheet_range("Extracted Table").unwrap();
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("Item".into())));
    assert_eq!(range.get_value((0, 1)), Some(&Data::String("Amount".into())));
    assert_eq!(range.get_value((1, 1)), Some(&Data::Float(2250.0)));
    assert_eq!(range.get_value((2, 1)), Some(&Data::String("49.50".into())));

    assert_eq!(files_in(&app.dir.path().join("uploads")), 0);
    assert_eq!(files_in(&app.dir.path().join("outputs")), 0);
}

#[tokio::test]
async fn image_json_endpoint_returns_tables() {
    let app = app().await;
    let request = multipart("/api/extract-table-json", "scan.jpg", "image/jpeg", &png_bytes());
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["total_tables"], 1);
    assert_eq!(body["extraction_method"], "gemini-2.5-flash");
    assert_eq!(body["tables"][0]["headers"], json!(["Item", "Amount"]));
}

#[tokio::test]
async fn image_json_endpoint_reports_failures_in_body() {
    let mut model = FakeGemini::new();
    model.table_reply = "garbage".to_string();
    let app = app_with(model, |_| {}).await;

    let request = multipart("/api/extract-table-json", "scan.png", "image/png", &png_bytes());
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["total_tables"], 0);
    assert_eq!(body["tables"], json!([]));
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse Gemini response after 3 attempts"));
    assert_eq!(app.model.call_count(), 3);

    let request = multipart("/api/extract-table", "scan.png", "image/png", &png_bytes());
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // the logged 5xx body still reaches the client intact
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal server error");
    assert!(body["message"].as_str().unwrap().contains("after 3 attempts"));
}

#[tokio::test]
async fn empty_extraction_is_404_with_suggestion() {
    let mut model = FakeGemini::new();
    model.table_reply = EMPTY_TABLE_REPLY.to_string();
    let app = app_with(model, |_| {}).await;

    let request = multipart("/api/extract-table", "blank.png", "image/png", &png_bytes());
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "No tables detected in image");
    assert!(body["suggestion"].as_str().unwrap().contains("clearer image"));
}

#[tokio::test]
async fn upload_validation() {
    let app = app_with(FakeGemini::new(), |c| c.max_image_bytes = 1024).await;

    let wrong_type = multipart("/api/extract-table", "notes.txt", "text/plain", b"hello");
    let response = app.router.clone().oneshot(wrong_type).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid file type"));

    let not_an_image = multipart("/api/extract-table", "fake.png", "image/png", b"not really a png");
    let response = app.router.clone().oneshot(not_an_image).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let too_big = multipart("/api/extract-table", "big.png", "image/png", &vec![0u8; 4096]);
    let response = app.router.clone().oneshot(too_big).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["error"], "File too large");

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/extract-table")
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=x")
        .body(axum::body::Body::from("--x--\r\n"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.model.call_count(), 0);
}

#[tokio::test]
async fn pdf_info_reports_pages_and_quota() {
    let app = app().await;
    let request = multipart("/api/pdf-info", "report.pdf", "application/pdf", &pdf_bytes(2));
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["filename"], "report.pdf");
    assert_eq!(body["valid"], true);
    assert_eq!(body["page_count"], 2);
    assert_eq!(body["max_pages"], 25);
    assert_eq!(body["quota"]["used"], 0);
    assert_eq!(body["quota"]["limit"], 100);
}

#[tokio::test]
async fn pdf_converts_and_counts_against_quota() {
    let app = app().await;
    let request = multipart("/api/pdf-to-excel", "report.pdf", "application/pdf", &pdf_bytes(2));
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-pages-total"], "2");
    assert_eq!(response.headers()["x-pages-successful"], "2");
    assert_eq!(response.headers()["x-pages-failed"], "0");
    assert_eq!(response.headers()["x-quota-remaining"], "99");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report_tables.xlsx\""
    );

    let mut book = workbook(body_bytes(response).await);
    assert_eq!(book.sheet_names(), vec!["Page 1", "Page 2"]);
    let page = book.worksheet_range("Page 2").unwrap();
    assert_eq!(page.get_value((0, 0)), Some(&Data::String("Month".into())));
    assert_eq!(page.get_value((2, 1)), Some(&Data::Float(12.0)));
    assert_eq!(app.model.call_count(), 2);

    let usage = body_json(app.router.oneshot(get("/api/pdf-quota")).await.unwrap()).await;
    assert_eq!(usage["used"], 1);
    assert_eq!(usage["remaining"], 99);
    assert_eq!(usage["percentage"], 1.0);
}

#[tokio::test]
async fn spent_quota_blocks_conversion() {
    let app = app_with(FakeGemini::new(), |c| c.pdf_daily_limit = 1).await;

    let first = multipart("/api/pdf-to-excel", "a.pdf", "application/pdf", &pdf_bytes(1));
    let response = app.router.clone().oneshot(first).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-quota-remaining"], "0");

    let second = multipart("/api/pdf-to-excel", "b.pdf", "application/pdf", &pdf_bytes(1));
    let response = app.router.clone().oneshot(second).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Daily quota exceeded (1 conversions per day). Resets at midnight UTC."
    );
    assert_eq!(body["quota"]["used"], 1);
    assert_eq!(app.model.call_count(), 1);
}

#[tokio::test]
async fn failed_conversions_are_not_counted() {
    let mut model = FakeGemini::new();
    model.page_reply = "no json here".to_string();
    let app = app_with(model, |c| c.max_pdf_pages = 2).await;

    let failing = multipart("/api/pdf-to-excel", "a.pdf", "application/pdf", &pdf_bytes(1));
    let response = app.router.clone().oneshot(failing).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["message"],
        "All 1 pages failed to process"
    );

    let too_long = multipart("/api/pdf-to-excel", "b.pdf", "application/pdf", &pdf_bytes(3));
    let response = app.router.clone().oneshot(too_long).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "PDF has 3 pages. Maximum allowed: 2 pages."
    );

    let usage = body_json(app.router.oneshot(get("/api/pdf-quota")).await.unwrap()).await;
    assert_eq!(usage["used"], 0);
}

#[tokio::test]
async fn admin_reset_is_hidden_without_token() {
    let app = app().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/admin/pdf-quota/reset")
        .header(header::AUTHORIZATION, "Bearer anything")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_reset_requires_bearer_token() {
    let app = app_with(FakeGemini::new(), |c| c.admin_token = Some("s3cret".to_string())).await;

    let convert = multipart("/api/pdf-to-excel", "a.pdf", "application/pdf", &pdf_bytes(1));
    assert_eq!(
        app.router.clone().oneshot(convert).await.unwrap().status(),
        StatusCode::OK
    );

    let reset = |auth: Option<&str>| {
        let mut builder = axum::http::Request::builder()
            .method("POST")
            .uri("/api/admin/pdf-quota/reset");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(axum::body::Body::empty()).unwrap()
    };

    let response = app.router.clone().oneshot(reset(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = app.router.clone().oneshot(reset(Some("Bearer wrong"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.router.clone().oneshot(reset(Some("Bearer s3cret"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["previous_count"], 1);
    assert_eq!(body["new_count"], 0);
}

#[tokio::test]
async fn tts_catalogs() {
    let app = app().await;

    let voices = body_json(app.router.clone().oneshot(get("/api/tts/voices")).await.unwrap()).await;
    assert_eq!(voices["total_voices"], 30);
    assert_eq!(voices["voice_types"][0], "professional");

    let languages =
        body_json(app.router.oneshot(get("/api/tts/languages")).await.unwrap()).await;
    assert_eq!(languages["total"], 24);
    assert_eq!(languages["languages"]["en-US"], "English (United States)");
}

#[tokio::test]
async fn tts_generate_returns_wav() {
    let app = app().await;
    let request = json_post(
        "/api/tts/generate",
        json!({"text": "Quarterly totals are ready", "voice": "Puck", "style_prompt": "cheerfully"}),
    );
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(response.headers()["x-audio-duration"], "0.50");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("tts_"));
    assert!(disposition.ends_with("_Puck.wav\""));

    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(bytes.len(), 44 + 24_000);

    let sent = app.model.calls.lock().unwrap()[0].clone();
    assert_eq!(
        sent.contents[0].parts[0].text.as_deref(),
        Some("Say cheerfully: Quarterly totals are ready")
    );
    assert_eq!(files_in(&app.dir.path().join("outputs")), 0);
}

#[tokio::test]
async fn tts_dialog_returns_wav() {
    let app = app().await;
    let request = json_post(
        "/api/tts/generate-dialog",
        json!({
            "speakers": [{"name": "Host", "voice": "Charon"}, {"voice": "Leda"}],
            "transcript": "Host: Welcome!\nSpeaker2: Thanks for having me."
        }),
    );
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("tts_dialog_"));
}

#[tokio::test]
async fn tts_rejects_bad_input() {
    let app = app().await;

    let cases = [
        ("/api/tts/generate", json!({"text": "   "})),
        ("/api/tts/generate", json!({"text": "hi", "temperature": 3.0})),
        ("/api/tts/generate", json!({"voice": "Kore"})),
        (
            "/api/tts/generate-dialog",
            json!({"speakers": [{}, {}, {}], "transcript": "A: hi"}),
        ),
        ("/api/tts/generate-dialog", json!({"speakers": [{}], "transcript": ""})),
    ];
    for (uri, body) in cases {
        let response = app.router.clone().oneshot(json_post(uri, body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
    }
    assert_eq!(app.model.call_count(), 0);
}
