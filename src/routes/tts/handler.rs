use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderValue,
    response::Response,
};

use crate::{
    AppState,
    error::AppError,
    routes::attachment,
    tts::{
        AudioOutput, DialogRequest, LanguageCatalog, SpeechRequest, VoiceCatalog, WAV_CONTENT_TYPE,
        language_catalog, voice_catalog,
    },
    utils::TempFile,
};

pub const AUDIO_DURATION_HEADER: &str = "x-audio-duration";

pub async fn voices() -> Json<VoiceCatalog> {
    Json(voice_catalog())
}

pub async fn languages() -> Json<LanguageCatalog> {
    Json(language_catalog())
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

async fn audio_response(output: AudioOutput) -> Result<Response, AppError> {
    let file = TempFile::new(&output.path);
    let bytes = tokio::fs::read(file.path()).await?;

    let mut response = attachment(bytes, WAV_CONTENT_TYPE, &output.filename);
    let duration = format!("{:.2}", output.duration);
    if let Ok(value) = HeaderValue::from_str(&duration) {
        response.headers_mut().insert(AUDIO_DURATION_HEADER, value);
    }
    Ok(response)
}

#[axum::debug_handler]
pub async fn generate_speech(
    State(state): State<AppState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = json_body(payload)?;
    let output = state.tts.generate_speech(request).await?;
    audio_response(output).await
}

#[axum::debug_handler]
pub async fn generate_dialog(
    State(state): State<AppState>,
    payload: Result<Json<DialogRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let request = json_body(payload)?;
    let output = state.tts.generate_dialog(request).await?;
    audio_response(output).await
}
