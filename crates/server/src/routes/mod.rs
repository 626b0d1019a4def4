//! API route handlers
//!
//! - `health`: liveness, readiness and Prometheus metrics
//! - `apply`: strict application intake
//! - `contact`: loose contact intake (JSON, urlencoded, multipart)
//! - `events`: event-bus delivery into the notification worker

pub mod apply;
pub mod contact;
pub mod events;
pub mod health;

use axum::http::header::USER_AGENT;
use axum::http::HeaderMap;
use schema::Receipt;

use crate::error::ApiError;

/// 404 Not Found handler
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// Client address and user agent of a request.
pub(crate) fn receipt_from_headers(headers: &HeaderMap) -> Receipt {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    Receipt::new(guard::client_ip(headers), user_agent)
}
