use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::Json;
use dispatch::EventEnvelope;
use notify::NotificationReport;
use subtle::ConstantTimeEq;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /api/events`
///
/// Delivery target of the event bus. Runs the notification worker on one
/// envelope and returns its report; step failures are part of the report,
/// not the status code.
pub async fn receive_event(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<NotificationReport>> {
    let secret = state.notify_secret().ok_or(ApiError::NotificationsDisabled)?;
    if !bearer_matches(&headers, secret) {
        return Err(ApiError::Unauthorized);
    }

    let event: EventEnvelope =
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidEvent(e.to_string()))?;

    Ok(Json(state.notifier.handle(&event).await))
}

fn bearer_matches(headers: &HeaderMap, secret: &str) -> bool {
    let Some(token) = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    else {
        return false;
    };
    token.as_bytes().ct_eq(secret.as_bytes()).into()
}
