//! Request and response bodies of the REST surface.
//!
//! Amounts serialize as bare JSON numbers, instants as RFC 3339.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Operation, OperationStatus};

/// Body of `POST /api/user/register` and `POST /api/user/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub login: String,
    pub password: String,
}

/// Token triple returned by register/login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl TokenResponse {
    pub fn bearer(access_token: String, expires_in: u64) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

/// Body of `GET /api/user/balance`.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub current: Decimal,
    pub withdrawn: Decimal,
}

/// Body of `POST /api/user/balance/withdraw`. `sum` is a positive
/// magnitude; the ledger stores the debit negated.
#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: Decimal,
}

/// One element of the `GET /api/user/orders` list.
#[derive(Debug, Serialize)]
pub struct OrderListItem {
    pub number: Option<String>,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Operation> for OrderListItem {
    fn from(op: &Operation) -> Self {
        Self {
            number: op.order_number.clone(),
            status: op.status,
            accrual: (!op.amount.is_zero()).then_some(op.amount),
            uploaded_at: op.created_at,
        }
    }
}

/// One element of the `GET /api/user/withdrawals` list. `sum` is reported
/// as a positive magnitude.
#[derive(Debug, Serialize)]
pub struct WithdrawalListItem {
    pub order: Option<String>,
    pub status: OperationStatus,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl From<&Operation> for WithdrawalListItem {
    fn from(op: &Operation) -> Self {
        Self {
            order: op.order_number.clone(),
            status: op.status,
            sum: -op.amount,
            processed_at: op.updated_at,
        }
    }
}

/// One element of the `GET /api/user/balance/history` list.
#[derive(Debug, Serialize)]
pub struct HistoryListItem {
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub description: String,
    pub processed_at: DateTime<Utc>,
}

impl From<&Operation> for HistoryListItem {
    fn from(op: &Operation) -> Self {
        Self {
            amount: op.amount,
            number: op.order_number.clone(),
            description: op.description.clone(),
            processed_at: op.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationType;

    fn withdrawal_op() -> Operation {
        Operation {
            id: 1,
            user_id: 1,
            op_type: OperationType::OrderWithdrawal,
            status: OperationStatus::Processed,
            amount: Decimal::new(-4000, 2),
            description: "Списание баллов за заказ 2377225624".to_string(),
            order_number: Some("2377225624".to_string()),
            promo_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_withdrawal_sum_reported_positive() {
        let item = WithdrawalListItem::from(&withdrawal_op());
        assert_eq!(item.sum, Decimal::new(4000, 2));
    }

    #[test]
    fn test_zero_accrual_omitted() {
        let mut op = withdrawal_op();
        op.op_type = OperationType::OrderAccrual;
        op.status = OperationStatus::New;
        op.amount = Decimal::ZERO;

        let json = serde_json::to_string(&OrderListItem::from(&op)).unwrap();
        assert!(!json.contains("accrual"));
        assert!(json.contains("\"status\":\"NEW\""));
    }

    #[test]
    fn test_amounts_serialize_as_numbers() {
        let item = WithdrawalListItem::from(&withdrawal_op());
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"sum\":40.00"), "json: {json}");
    }
}
