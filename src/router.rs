use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    AppState,
    middleware::{log_errors, quota_gate, require_admin},
    routes::{self, pdf, table, tts},
};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

fn table_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/extract-table", post(table::extract_table))
        .route("/api/extract-table-json", post(table::extract_table_json))
        .layer(DefaultBodyLimit::max(
            state.config.max_image_bytes + MULTIPART_OVERHEAD,
        ))
}

fn pdf_routes(state: &AppState) -> Router<AppState> {
    let conversion = Router::new()
        .route("/api/pdf-to-excel", post(pdf::pdf_to_excel))
        .route_layer(from_fn_with_state(state.quota.clone(), quota_gate));

    Router::new()
        .route("/api/pdf-info", post(pdf::pdf_info))
        .merge(conversion)
        .layer(DefaultBodyLimit::max(
            state.config.max_pdf_bytes + MULTIPART_OVERHEAD,
        ))
        .route("/api/pdf-quota", get(pdf::pdf_quota))
}

fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/pdf-quota/reset", post(pdf::reset_quota))
        .route_layer(from_fn_with_state(state.clone(), require_admin))
}

fn tts_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tts/voices", get(tts::voices))
        .route("/api/tts/languages", get(tts::languages))
        .route("/api/tts/generate", post(tts::generate_speech))
        .route("/api/tts/generate-dialog", post(tts::generate_dialog))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .merge(table_routes(&state))
        .merge(pdf_routes(&state))
        .merge(admin_routes(&state))
        .merge(tts_routes())
        .fallback(routes::not_found)
        .layer(from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
