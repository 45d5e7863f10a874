//! HTTP handlers, one module per surface area. Handlers stay thin: decode,
//! delegate to a service, render. Exactly one error body per request.

mod auth;
mod balance;
mod orders;
mod promos;

pub use auth::{login, register};
pub use balance::{balance_get, history_list, withdraw_create, withdrawals_list};
pub use orders::{orders_create, orders_list};
pub use promos::promo_apply;

use axum::http::{HeaderMap, header};

use crate::errors::AppError;

/// The plain-text endpoints accept nothing else.
fn require_plain_text(headers: &HeaderMap) -> Result<(), AppError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with("text/plain") {
        return Err(AppError::BadRequest);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_require_plain_text() {
        let mut headers = HeaderMap::new();
        assert!(require_plain_text(&headers).is_err());

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(require_plain_text(&headers).is_ok());

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        assert!(require_plain_text(&headers).is_ok());

        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        assert!(require_plain_text(&headers).is_err());
    }
}
