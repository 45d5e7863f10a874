//! Order upload and listing.

use axum::Extension;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use super::require_plain_text;
use crate::errors::{AppError, ErrorResponse};
use crate::gateway::middleware::{AuthUser, RequestId};
use crate::gateway::state::AppState;
use crate::gateway::types::OrderListItem;
use crate::models::OperationType;

/// POST /api/user/orders (text/plain order number)
///
/// 202 when the number is accepted; 200 when this user already uploaded
/// it; 409 when another user owns it; 422 when the number fails the
/// checksum; 400 on an empty body or wrong content type.
pub async fn orders_create(
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
        .order_accrual_prepare(user_id, &body)
        .map_err(&fail)?;

    match state.operations.create(op).await {
        Ok(_) => Ok(StatusCode::ACCEPTED.into_response()),
        // the user re-posted their own order number
        Err(AppError::OrderUsed) => Ok(StatusCode::OK.into_response()),
        Err(e) => Err(fail(e)),
    }
}

/// GET /api/user/orders
///
/// 200 with the accrual list, newest first; 204 when there is none.
pub async fn orders_list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ErrorResponse> {
    let fail = |e: AppError| e.with_request_id(request_id.0.clone());

    let ops = state
        .operations
        .list_by_type(user_id, OperationType::OrderAccrual)
        .await
        .map_err(&fail)?;

    if ops.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let items: Vec<OrderListItem> = ops.iter().map(OrderListItem::from).collect();
    Ok(Json(items).into_response())
}
