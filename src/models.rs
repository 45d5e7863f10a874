//! Data models for the point ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Registered account. `balance` and `withdrawn` are derived columns,
/// recomputed from the account's operations inside every mutating
/// transaction.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub pass_hash: String,
    pub balance: Decimal,
    pub withdrawn: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ledger entry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Operation {
    pub id: i64,
    pub user_id: i64,
    pub op_type: OperationType,
    pub status: OperationStatus,
    pub amount: Decimal,
    pub description: String,
    /// Set for order operations, absent for promo accruals
    pub order_number: Option<String>,
    /// Set for promo accruals, absent for order operations
    pub promo_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "operation_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    OrderAccrual,
    OrderWithdrawal,
    PromoAccrual,
}

/// Execution status of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "operation_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationStatus {
    New,
    Processing,
    Processed,
    Invalid,
    Canceled,
}

impl OperationStatus {
    /// Terminal statuses admit no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Processed | Self::Invalid | Self::Canceled)
    }

    /// Whether the transition `self -> to` is a legal edge of the status
    /// graph. Staying in place is always allowed.
    pub fn can_transit(self, to: OperationStatus) -> bool {
        if self == to {
            return true;
        }
        match self {
            Self::New => true,
            Self::Processing => to.is_terminal(),
            Self::Processed | Self::Invalid | Self::Canceled => false,
        }
    }
}

/// Promotional reward window.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Promo {
    pub id: i64,
    pub code: String,
    pub description: String,
    pub reward: Decimal,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Promo {
    /// Both window ends are inclusive.
    pub fn is_active_at(&self, t: DateTime<Utc>) -> bool {
        self.not_before <= t && t <= self.not_after
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_status_can_transit() {
        use OperationStatus::*;

        let cases = [
            (New, Processed, true),
            (New, Processing, true),
            (New, Invalid, true),
            (New, Canceled, true),
            (Processing, Processed, true),
            (Processing, Canceled, true),
            (Processing, New, false),
            (Processed, Processing, false),
            (Processed, Canceled, false),
            (Canceled, Canceled, true),
            (Invalid, New, false),
        ];
        for (from, to, want) in cases {
            assert_eq!(
                from.can_transit(to),
                want,
                "transition {:?} -> {:?}",
                from,
                to
            );
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OperationStatus::New.is_terminal());
        assert!(!OperationStatus::Processing.is_terminal());
        assert!(OperationStatus::Processed.is_terminal());
        assert!(OperationStatus::Invalid.is_terminal());
        assert!(OperationStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_promo_window_is_inclusive() {
        let not_before = Utc::now();
        let not_after = not_before + TimeDelta::hours(1);
        let promo = Promo {
            id: 1,
            code: "WELCOME2022".to_string(),
            description: String::new(),
            reward: Decimal::new(100, 0),
            not_before,
            not_after,
            created_at: not_before,
        };

        assert!(promo.is_active_at(not_before));
        assert!(promo.is_active_at(not_after));
        assert!(!promo.is_active_at(not_before - TimeDelta::nanoseconds(1000)));
        assert!(!promo.is_active_at(not_after + TimeDelta::nanoseconds(1000)));
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let s = serde_json::to_string(&OperationStatus::Processed).unwrap();
        assert_eq!(s, "\"PROCESSED\"");
        let back: OperationStatus = serde_json::from_str("\"INVALID\"").unwrap();
        assert_eq!(back, OperationStatus::Invalid);
    }
}
