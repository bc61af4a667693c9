use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, error::AppError};

/// Bearer-token guard for admin routes. Without a configured token the
/// routes behave as if they did not exist.
pub async fn require_admin(State(state): State<AppState>, req: Request<Body>, next: Next) -> Response {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return AppError::not_found("Endpoint not found").into_response();
    };

    match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(auth) if auth.token() == expected => next.run(req).await,
        Some(_) => {
            tracing::warn!("Rejected admin request to {} with a wrong token", req.uri().path());
            AppError::Unauthorized.into_response()
        }
        None => AppError::Unauthorized.into_response(),
    }
}
