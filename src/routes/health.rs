use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub extraction_method: String,
    pub timestamp: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "Gemini Image-to-Excel Service",
        version: env!("CARGO_PKG_VERSION"),
        extraction_method: state.config.table_model.clone(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
