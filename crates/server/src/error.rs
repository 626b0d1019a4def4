use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intake::{IntakeError, Route};
use serde::{Deserialize, Serialize};

/// Message returned with every accepted contact submission.
pub const CONTACT_THANKS: &str = "Thanks! We will get back to you within one business day.";

pub type ApiResult<T> = Result<T, ApiError>;

/// Server error types
///
/// Submission failures keep the route they happened on, because the two
/// intake routes answer with different code vocabularies.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("application refused: {0}")]
    Apply(#[source] IntakeError),

    #[error("contact submission refused: {0}")]
    Contact(#[source] IntakeError),

    #[error("request body could not be read: {reason}")]
    UnreadableBody { route: Route, reason: String },

    #[error("event payload is invalid: {0}")]
    InvalidEvent(String),

    #[error("missing or invalid bearer secret")]
    Unauthorized,

    #[error("notification endpoint is not configured")]
    NotificationsDisabled,

    #[error("metrics are disabled")]
    MetricsDisabled,

    #[error("handler panicked")]
    Panic,

    #[error("request timed out")]
    Timeout,

    #[error("middleware failed: {0}")]
    Internal(String),

    #[error("Not found")]
    NotFound,
}

/// Response body shared by every JSON endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiBody {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiBody {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
            message: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(code: &str, message: Option<String>) -> Self {
        Self {
            ok: false,
            error: Some(code.to_string()),
            message,
        }
    }
}

fn apply_status(err: &IntakeError) -> (StatusCode, &'static str) {
    match err {
        IntakeError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        IntakeError::Schema(e) if e.is_unparseable() => (StatusCode::BAD_REQUEST, "invalid_json"),
        IntakeError::Schema(_) => (StatusCode::BAD_REQUEST, "invalid"),
        IntakeError::BotDetected { .. } | IntakeError::TokenMissing => {
            (StatusCode::BAD_REQUEST, "bot_detected")
        }
        IntakeError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "db_error"),
        IntakeError::Dispatch(_) => (StatusCode::INTERNAL_SERVER_ERROR, "dispatch_error"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    }
}

fn contact_status(err: &IntakeError) -> (StatusCode, &'static str, Option<String>) {
    match err {
        IntakeError::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            "TOO_MANY_REQUESTS",
            Some("Too many requests. Please try again later.".into()),
        ),
        IntakeError::Schema(e) if e.is_unparseable() => (
            StatusCode::BAD_REQUEST,
            "INVALID_BODY",
            Some("The request body could not be read.".into()),
        ),
        IntakeError::Schema(e) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", Some(e.to_string())),
        IntakeError::TokenMissing => (
            StatusCode::BAD_REQUEST,
            "TURNSTILE_TOKEN_MISSING",
            Some("Please complete the verification challenge.".into()),
        ),
        IntakeError::BotDetected { .. } => (
            StatusCode::BAD_REQUEST,
            "TURNSTILE_FAILED",
            Some("Verification failed. Please try again.".into()),
        ),
        IntakeError::Dispatch(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "DISPATCH_FAILED",
            Some("We could not send your message. Please try again later.".into()),
        ),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
    }
}

impl ApiError {
    /// Get HTTP status code, error code and optional message for this error
    fn parts(&self) -> (StatusCode, &'static str, Option<String>) {
        match self {
            ApiError::Apply(err) => {
                let (status, code) = apply_status(err);
                (status, code, None)
            }
            ApiError::Contact(err) => contact_status(err),
            ApiError::UnreadableBody {
                route: Route::Apply,
                ..
            } => (StatusCode::BAD_REQUEST, "invalid_json", None),
            ApiError::UnreadableBody {
                route: Route::Contact,
                ..
            } => (
                StatusCode::BAD_REQUEST,
                "INVALID_BODY",
                Some("The request body could not be read.".into()),
            ),
            ApiError::InvalidEvent(_) => (StatusCode::BAD_REQUEST, "invalid_event", None),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            ApiError::NotificationsDisabled => {
                (StatusCode::SERVICE_UNAVAILABLE, "notifications_disabled", None)
            }
            ApiError::MetricsDisabled => (StatusCode::NOT_FOUND, "metrics_disabled", None),
            ApiError::Panic | ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            ApiError::Timeout => (StatusCode::REQUEST_TIMEOUT, "request_timeout", None),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code, error = %self, "request_failed");
        } else {
            tracing::debug!(status = status.as_u16(), code, error = %self, "request_refused");
        }

        (status, Json(ApiBody::error(code, message))).into_response()
    }
}
