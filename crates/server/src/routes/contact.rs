use std::sync::Arc;

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use intake::{IntakeError, Route};
use schema::FormFields;

use crate::error::{ApiBody, ApiError, ApiResult, CONTACT_THANKS};
use crate::routes::receipt_from_headers;
use crate::state::AppState;

/// Body encodings the contact form is posted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    UrlEncoded,
    Multipart,
}

impl BodyKind {
    /// Anything that is not a form encoding is read as JSON.
    fn from_content_type(content_type: Option<&str>) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match mime.as_str() {
            "multipart/form-data" => BodyKind::Multipart,
            "application/x-www-form-urlencoded" => BodyKind::UrlEncoded,
            _ => BodyKind::Json,
        }
    }
}

/// `POST /api/contact`
pub async fn submit_contact(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> ApiResult<Json<ApiBody>> {
    let receipt = receipt_from_headers(request.headers());
    state.contact.admit(&receipt).await.map_err(ApiError::Contact)?;

    let kind = BodyKind::from_content_type(
        request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
    );
    let fields = match read_fields(kind, request, state.config.max_body_size()).await {
        Ok(fields) => fields,
        Err(err) => {
            state.contact.reject_unreadable();
            return Err(err);
        }
    };

    state
        .contact
        .submit(&fields, &receipt)
        .await
        .map_err(ApiError::Contact)?;

    Ok(Json(ApiBody::ok_with_message(CONTACT_THANKS)))
}

async fn read_fields(kind: BodyKind, request: Request, limit: usize) -> ApiResult<FormFields> {
    if kind == BodyKind::Multipart {
        return read_multipart(request).await;
    }

    let body = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(unreadable)?;
    let parsed = match kind {
        BodyKind::UrlEncoded => FormFields::from_urlencoded_bytes(&body),
        _ => FormFields::from_json_bytes(&body),
    };
    parsed.map_err(|err| ApiError::Contact(IntakeError::from(err)))
}

/// Text parts only; uploaded files are skipped.
async fn read_multipart(request: Request) -> ApiResult<FormFields> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(unreadable)?;

    let mut fields = FormFields::new();
    while let Some(field) = multipart.next_field().await.map_err(unreadable)? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field.text().await.map_err(unreadable)?;
        fields.append(name, value);
    }
    Ok(fields)
}

fn unreadable(err: impl std::fmt::Display) -> ApiError {
    ApiError::UnreadableBody {
        route: Route::Contact,
        reason: err.to_string(),
    }
}
