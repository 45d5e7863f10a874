//! Request-scoped middleware: request ids and bearer-token authentication.

use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use super::state::AppState;
use crate::auth::extract_bearer;
use crate::errors::{AppError, ErrorResponse};

/// Request id assigned at the edge; error bodies echo it back.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Authenticated caller, injected by [`auth_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    request.extensions_mut().insert(RequestId(id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Verify the `Authorization` header (`Bearer <jwt>` or a bare token) and
/// inject the caller's user id.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ErrorResponse> {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone());
    let reject = |error: AppError| ErrorResponse {
        error,
        request_id: request_id.clone(),
    };

    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| reject(AppError::Unauthorized))?;

    let user_id = state
        .auth
        .verify(extract_bearer(header))
        .map_err(|_| reject(AppError::Unauthorized))?;

    tracing::debug!(user_id, "user authenticated");
    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}
