//! Withdrawal finalizer
//!
//! Drives order-withdrawal operations to a terminal state once a 60-second
//! grace period has passed: order numbers starting with `000` are canceled,
//! everything else is processed. Younger rows are deferred by aborting the
//! transaction, which leaves their `updated_at` untouched and therefore at
//! the head of the queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::sync::watch;

use crate::errors::AppError;
use crate::models::{Operation, OperationStatus, OperationType};
use crate::service::OperationService;

const POLL_INTERVAL: Duration = Duration::from_secs(1);
const GRACE_SECONDS: i64 = 60;
const CANCEL_PREFIX: &str = "000";

pub struct WithdrawalFinalizer {
    operations: Arc<OperationService>,
    poll_interval: Duration,
}

impl WithdrawalFinalizer {
    pub fn new(operations: Arc<OperationService>) -> Arc<Self> {
        Arc::new(Self {
            operations,
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Run until `shutdown` fires; each timer expiry spawns a detached tick.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        tracing::info!("withdrawal finalizer started");
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    tracing::info!("withdrawal finalizer stopped");
                    return;
                }
                _ = tokio::time::sleep(self.poll_interval) => {
                    let finalizer = Arc::clone(&self);
                    tokio::spawn(async move { finalizer.tick().await });
                }
            }
        }
    }

    async fn tick(&self) {
        let result = self
            .operations
            .update_further(OperationType::OrderWithdrawal, |op| async move {
                Self::finalize(op, Utc::now())
            })
            .await;
        match result {
            Ok(op) => {
                tracing::info!(operation_id = op.id, status = ?op.status, "withdrawal operation finalized")
            }
            Err(AppError::NotFound) => tracing::debug!("no withdrawal operations to finalize"),
            Err(e) => tracing::error!(error = %e, "withdrawal operation update failed"),
        }
    }

    /// Decide the fate of one withdrawal at instant `now`.
    fn finalize(
        mut op: Operation,
        now: chrono::DateTime<Utc>,
    ) -> Result<Operation, AppError> {
        let Some(number) = op.order_number.as_deref() else {
            tracing::error!(operation_id = op.id, "withdrawal operation without order number");
            return Err(AppError::Internal);
        };

        if now - op.created_at <= TimeDelta::seconds(GRACE_SECONDS) {
            // too young, defer
            return Err(AppError::NotFound);
        }

        op.status = if number.starts_with(CANCEL_PREFIX) {
            OperationStatus::Canceled
        } else {
            OperationStatus::Processed
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn withdrawal(order_number: &str, age_seconds: i64) -> Operation {
        let created_at = Utc::now() - TimeDelta::seconds(age_seconds);
        Operation {
            id: 1,
            user_id: 1,
            op_type: OperationType::OrderWithdrawal,
            status: OperationStatus::New,
            amount: Decimal::new(-40, 0),
            description: String::new(),
            order_number: Some(order_number.to_string()),
            promo_id: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_young_withdrawal_is_deferred() {
        let op = withdrawal("2377225624", 10);
        let now = Utc::now();
        assert_eq!(
            WithdrawalFinalizer::finalize(op, now).unwrap_err(),
            AppError::NotFound
        );
    }

    #[test]
    fn test_old_withdrawal_is_processed() {
        let op = withdrawal("2377225624", 90);
        let out = WithdrawalFinalizer::finalize(op, Utc::now()).unwrap();
        assert_eq!(out.status, OperationStatus::Processed);
    }

    #[test]
    fn test_marked_order_is_canceled() {
        let op = withdrawal("000995542", 90);
        let out = WithdrawalFinalizer::finalize(op, Utc::now()).unwrap();
        assert_eq!(out.status, OperationStatus::Canceled);
    }

    #[test]
    fn test_missing_order_number_is_internal() {
        let mut op = withdrawal("2377225624", 90);
        op.order_number = None;
        assert_eq!(
            WithdrawalFinalizer::finalize(op, Utc::now()).unwrap_err(),
            AppError::Internal
        );
    }
}
