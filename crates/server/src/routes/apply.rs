use std::sync::Arc;

use axum::extract::{Request, State};
use axum::Json;
use intake::Route;

use crate::error::{ApiBody, ApiError, ApiResult};
use crate::routes::receipt_from_headers;
use crate::state::AppState;

/// `POST /api/apply`
///
/// The rate limit runs before the body is read. Honeypot hits answer like a
/// normal success.
pub async fn submit_application(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> ApiResult<Json<ApiBody>> {
    let receipt = receipt_from_headers(request.headers());
    state.apply.admit(&receipt).await.map_err(ApiError::Apply)?;

    let body = axum::body::to_bytes(request.into_body(), state.config.max_body_size())
        .await
        .map_err(|e| {
            state.apply.reject_unreadable();
            ApiError::UnreadableBody {
                route: Route::Apply,
                reason: e.to_string(),
            }
        })?;

    state
        .apply
        .submit(&body, &receipt)
        .await
        .map_err(ApiError::Apply)?;

    Ok(Json(ApiBody::ok()))
}
