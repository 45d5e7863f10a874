//! Domain error taxonomy
//!
//! Every failure the service can surface is one of these kinds. Each kind
//! carries a stable numeric domain code and a recommended HTTP status; the
//! gateway renders exactly one JSON error body per request:
//!
//! ```json
//! {"code": 1105, "error": "Insufficient funds", "request_id": "<uuid>"}
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Application error kinds. Grouped by origin: generic 1000-1099,
/// user 1100-1199, operation 1200-1299, promo 1300-1399, integration 1400+.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Internal error")]
    Internal,
    #[error("Not found")]
    NotFound,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Bad request")]
    BadRequest,

    #[error("User already exists")]
    LoginTaken,
    #[error("Invalid login")]
    LoginInvalid,
    #[error("Invalid password")]
    PasswordInvalid,
    #[error("Login or password mismatch")]
    LoginPassMismatch,
    #[error("Insufficient funds")]
    BalanceNegative,
    #[error("Withdrawn amount cannot be negative")]
    WithdrawnNegative,

    #[error("Invalid operation attributes")]
    AttrsInvalid,
    #[error("Invalid operation amount sign")]
    AmountSignInvalid,
    #[error("User not exists")]
    UserNotFound,
    #[error("Invalid order number")]
    OrderNumberInvalid,
    #[error("Order number belongs to another user")]
    OrderForeign,
    #[error("Order already used")]
    OrderUsed,
    #[error("Promo not exists")]
    PromoNotFound,
    #[error("Promo already used")]
    PromoUsed,
    #[error("Promo expired")]
    PromoExpired,

    #[error("Promo already exists")]
    PromoCodeTaken,
    #[error("Promo reward must be positive")]
    PromoRewardNotPositive,
    #[error("Invalid promo period")]
    PromoPeriodInvalid,

    #[error("Too many requests")]
    TooManyRequests,
    #[error("Accrual request failed")]
    RequestFailed,
}

impl AppError {
    /// Stable numeric domain code.
    pub fn code(self) -> u32 {
        match self {
            Self::Internal => 1000,
            Self::NotFound => 1001,
            Self::Unauthorized => 1002,
            Self::BadRequest => 1003,

            Self::LoginTaken => 1100,
            Self::LoginInvalid => 1101,
            Self::PasswordInvalid => 1102,
            Self::LoginPassMismatch => 1103,
            Self::BalanceNegative => 1105,
            Self::WithdrawnNegative => 1106,

            Self::AttrsInvalid => 1200,
            Self::AmountSignInvalid => 1201,
            Self::UserNotFound => 1202,
            Self::OrderNumberInvalid => 1203,
            Self::OrderForeign => 1204,
            Self::OrderUsed => 1205,
            Self::PromoNotFound => 1206,
            Self::PromoUsed => 1207,
            Self::PromoExpired => 1208,

            Self::PromoCodeTaken => 1300,
            Self::PromoRewardNotPositive => 1301,
            Self::PromoPeriodInvalid => 1302,

            Self::TooManyRequests => 1400,
            Self::RequestFailed => 1401,
        }
    }

    /// Recommended HTTP status for the kind.
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest => StatusCode::BAD_REQUEST,

            Self::LoginTaken => StatusCode::CONFLICT,
            Self::LoginInvalid => StatusCode::BAD_REQUEST,
            Self::PasswordInvalid => StatusCode::BAD_REQUEST,
            Self::LoginPassMismatch => StatusCode::UNAUTHORIZED,
            Self::BalanceNegative => StatusCode::PAYMENT_REQUIRED,
            Self::WithdrawnNegative => StatusCode::INTERNAL_SERVER_ERROR,

            Self::AttrsInvalid => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AmountSignInvalid => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::OrderNumberInvalid => StatusCode::UNPROCESSABLE_ENTITY,
            Self::OrderForeign => StatusCode::CONFLICT,
            Self::OrderUsed => StatusCode::CONFLICT,
            Self::PromoNotFound => StatusCode::BAD_REQUEST,
            Self::PromoUsed => StatusCode::CONFLICT,
            Self::PromoExpired => StatusCode::BAD_REQUEST,

            Self::PromoCodeTaken => StatusCode::CONFLICT,
            Self::PromoRewardNotPositive => StatusCode::BAD_REQUEST,
            Self::PromoPeriodInvalid => StatusCode::BAD_REQUEST,

            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::RequestFailed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attach the request id for rendering.
    pub fn with_request_id(self, request_id: impl Into<String>) -> ErrorResponse {
        ErrorResponse {
            error: self,
            request_id: Some(request_id.into()),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: u32,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

/// An [`AppError`] ready to be rendered as an HTTP response.
#[derive(Debug)]
pub struct ErrorResponse {
    pub error: AppError,
    pub request_id: Option<String>,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error,
            request_id: None,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.error.code(),
            error: self.error.to_string(),
            request_id: self.request_id,
        };
        (self.error.http_status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_match_statuses() {
        let cases = [
            (AppError::Internal, 1000, StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::NotFound, 1001, StatusCode::NOT_FOUND),
            (AppError::LoginTaken, 1100, StatusCode::CONFLICT),
            (AppError::LoginPassMismatch, 1103, StatusCode::UNAUTHORIZED),
            (AppError::BalanceNegative, 1105, StatusCode::PAYMENT_REQUIRED),
            (
                AppError::OrderNumberInvalid,
                1203,
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::OrderForeign, 1204, StatusCode::CONFLICT),
            (AppError::OrderUsed, 1205, StatusCode::CONFLICT),
            (AppError::PromoUsed, 1207, StatusCode::CONFLICT),
            (AppError::PromoCodeTaken, 1300, StatusCode::CONFLICT),
            (
                AppError::TooManyRequests,
                1400,
                StatusCode::TOO_MANY_REQUESTS,
            ),
        ];
        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.http_status(), status);
        }
    }

    #[test]
    fn test_error_body_shape() {
        let body = ErrorBody {
            code: AppError::BalanceNegative.code(),
            error: AppError::BalanceNegative.to_string(),
            request_id: Some("req-1".to_string()),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"code\":1105"));
        assert!(json.contains("\"error\":\"Insufficient funds\""));
        assert!(json.contains("\"request_id\":\"req-1\""));
    }
}
