//! Promo code redemption.

use axum::Extension;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::require_plain_text;
use crate::errors::{AppError, ErrorResponse};
use crate::gateway::middleware::{AuthUser, RequestId};
use crate::gateway::state::AppState;

/// POST /api/user/promos (text/plain promo code)
///
/// 200 when the reward is credited; 404 when the code is unknown or the
/// campaign is not currently active; 409 when this user already used it.
pub async fn promo_apply(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ErrorResponse> {
    let fail = |e: AppError| e.with_request_id(request_id.0.clone());

    require_plain_text(&headers).map_err(&fail)?;
    let op = state
        .operations
        .promo_accrual_prepare(user_id, &body)
        .await
        .map_err(&fail)?;
    state.operations.create(op).await.map_err(&fail)?;

    Ok(StatusCode::OK.into_response())
}
