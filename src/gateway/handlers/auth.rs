//! Registration and login.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use axum::Extension;

use crate::errors::{AppError, ErrorResponse};
use crate::gateway::middleware::RequestId;
use crate::gateway::state::AppState;
use crate::gateway::types::{CredentialsRequest, TokenResponse};

/// POST /api/user/register
///
/// 200 with a token triple on success; 409 when the login is taken;
/// 400 on a malformed body or invalid login/password.
pub async fn register(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let fail = |e: AppError| e.with_request_id(request_id.0.clone());

    let Json(creds) = body.map_err(|_| fail(AppError::BadRequest))?;
    let user = state
        .users
        .register(&creds.login, &creds.password)
        .await
        .map_err(&fail)?;

    token_response(&state, user.id).map_err(&fail)
}

/// POST /api/user/login
///
/// 200 with a token triple; 401 on a login/password mismatch; 400 on a
/// malformed body.
pub async fn login(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Response, ErrorResponse> {
    let fail = |e: AppError| e.with_request_id(request_id.0.clone());

    let Json(creds) = body.map_err(|_| fail(AppError::BadRequest))?;
    let user = state
        .users
        .check_login_pass(&creds.login, &creds.password)
        .await
        .map_err(&fail)?;

    token_response(&state, user.id).map_err(&fail)
}

fn token_response(state: &AppState, user_id: i64) -> Result<Response, AppError> {
    let token = state.auth.issue(user_id)?;
    let mut response =
        Json(TokenResponse::bearer(token.clone(), state.auth.ttl().as_secs())).into_response();

    // Non-standard, kept for compatibility: existing clients read the token
    // from the Authorization header of the response.
    if let Ok(value) = HeaderValue::from_str(&token) {
        response.headers_mut().insert(header::AUTHORIZATION, value);
    }
    Ok(response)
}
