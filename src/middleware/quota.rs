use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, quota::DailyQuota};

pub const QUOTA_REMAINING_HEADER: &str = "x-quota-remaining";

/// Rejects with 429 once the daily quota is spent; counts only 2xx responses.
pub async fn quota_gate(
    State(quota): State<Arc<DailyQuota>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match quota.check().await {
        Ok(check) if !check.allowed => {
            tracing::warn!("Quota exceeded: {}", check.message);
            let usage = match quota.usage().await {
                Ok(usage) => usage,
                Err(e) => return AppError::from(e).into_response(),
            };
            return AppError::QuotaExceeded {
                message: check.message,
                usage,
            }
            .into_response();
        }
        Ok(check) => tracing::debug!("Quota check passed: {} remaining", check.remaining),
        Err(e) => return AppError::from(e).into_response(),
    }

    let mut response = next.run(req).await;
    if !response.status().is_success() {
        return response;
    }

    match quota.increment().await {
        Ok(update) => {
            response.headers_mut().insert(
                QUOTA_REMAINING_HEADER,
                HeaderValue::from(update.remaining),
            );
        }
        Err(e) => tracing::error!("Failed to record conversion: {}", e),
    }
    response
}
