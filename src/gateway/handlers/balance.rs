//! Balance, withdrawals and the balance history.

use axum::Extension;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::errors::{AppError, ErrorResponse};
use crate::gateway::middleware::{AuthUser, RequestId};
use crate::gateway::state::AppState;
use crate::gateway::types::{
    BalanceResponse, HistoryListItem, WithdrawRequest, WithdrawalListItem,
};
use crate::models::OperationType;

/// GET /api/user/balance
pub async fn balance_get(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ErrorResponse> {
    let fail = |e: AppError| e.with_request_id(request_id.0.clone());

    let user = state.users.get_by_id(user_id).await.map_err(|e| match e {
        // an authenticated user must exist
        AppError::NotFound => fail(AppError::Internal),
        other => fail(other),
    })?;

    Ok(Json(BalanceResponse {
        current: user.balance,
        withdrawn: user.withdrawn,
    })
    .into_response())
}

/// POST /api/user/balance/withdraw (`{"order": "...", "sum": 40}`)
///
/// 200 on success; 402 when the balance does not cover the sum; 409 when
/// the order belongs to another user; 422 on a bad order number.
pub async fn withdraw_create(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    body: Result<Json<WithdrawRequest>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let fail = |e: AppError| e.with_request_id(request_id.0.clone());

    let Json(req) = body.map_err(|_| fail(AppError::BadRequest))?;
    let op = state
        .operations
        .order_withdrawal_prepare(user_id, &req.order, req.sum)
        .map_err(&fail)?;
    state.operations.create(op).await.map_err(&fail)?;

    Ok(StatusCode::OK.into_response())
}

/// GET /api/user/withdrawals
///
/// 200 with the withdrawal list; 204 when there is none.
pub async fn withdrawals_list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ErrorResponse> {
    let fail = |e: AppError| e.with_request_id(request_id.0.clone());

    let ops = state
        .operations
        .list_by_type(user_id, OperationType::OrderWithdrawal)
        .await
        .map_err(&fail)?;

    if ops.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let items: Vec<WithdrawalListItem> = ops.iter().map(WithdrawalListItem::from).collect();
    Ok(Json(items).into_response())
}

/// GET /api/user/balance/history
///
/// 200 with the operations that shaped the balance; 204 when empty.
pub async fn history_list(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Response, ErrorResponse> {
    let fail = |e: AppError| e.with_request_id(request_id.0.clone());

    let ops = state
        .operations
        .balance_history(user_id)
        .await
        .map_err(&fail)?;

    if ops.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let items: Vec<HistoryListItem> = ops.iter().map(HistoryListItem::from).collect();
    Ok(Json(items).into_response())
}
