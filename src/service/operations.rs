//! Operation assembly and the ledger-facing calls.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::errors::AppError;
use crate::luhn;
use crate::models::{Operation, OperationStatus, OperationType, Promo};
use crate::repo::Repo;

const ORDER_NUMBER_MAX_LEN: usize = 512;

pub struct OperationService {
    repo: Arc<Repo>,
}

impl OperationService {
    pub fn new(repo: Arc<Repo>) -> Self {
        Self { repo }
    }

    /// Build an order-accrual operation. The amount starts at zero and is
    /// filled in later by the accrual oracle.
    pub fn order_accrual_prepare(
        &self,
        user_id: i64,
        order_number: &str,
    ) -> Result<Operation, AppError> {
        validate_order_number(order_number)?;
        Ok(blank_operation(
            user_id,
            OperationType::OrderAccrual,
            OperationStatus::New,
            Decimal::ZERO,
            format!("Начисление баллов за заказ {order_number}"),
            Some(order_number.to_string()),
            None,
        ))
    }

    /// Build an order-withdrawal operation. The API hands us a positive
    /// magnitude; the ledger stores debits with a negative sign.
    pub fn order_withdrawal_prepare(
        &self,
        user_id: i64,
        order_number: &str,
        amount: Decimal,
    ) -> Result<Operation, AppError> {
        validate_order_number(order_number)?;
        Ok(blank_operation(
            user_id,
            OperationType::OrderWithdrawal,
            OperationStatus::New,
            -amount,
            format!("Списание баллов за заказ {order_number}"),
            Some(order_number.to_string()),
            None,
        ))
    }

    /// Build a promo-accrual operation. A missing code and an inactive one
    /// are indistinguishable to the caller. Promo credits bypass the work
    /// queue and are born processed.
    pub async fn promo_accrual_prepare(
        &self,
        user_id: i64,
        promo_code: &str,
    ) -> Result<Operation, AppError> {
        let promo = self.repo.promo_get_by_code(promo_code).await?;
        if !promo.is_active_at(Utc::now()) {
            tracing::debug!(promo_id = promo.id, "promo is not active");
            return Err(AppError::NotFound);
        }
        Ok(blank_operation(
            user_id,
            OperationType::PromoAccrual,
            OperationStatus::Processed,
            promo.reward,
            format!("Начисление баллов по промо-коду {promo_code}"),
            None,
            Some(promo.id),
        ))
    }

    /// Persist a prepared operation.
    pub async fn create(&self, op: Operation) -> Result<Operation, AppError> {
        let stored = self.repo.operation_create(&op).await?;
        tracing::info!(
            operation_id = stored.id,
            user_id = stored.user_id,
            "operation created"
        );
        Ok(stored)
    }

    /// Operations of one type for a user; never an error on empty.
    pub async fn list_by_type(
        &self,
        user_id: i64,
        op_type: OperationType,
    ) -> Result<Vec<Operation>, AppError> {
        match self.repo.operation_get_by_type(user_id, op_type).await {
            Err(AppError::NotFound) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Balance-relevant operations for a user; never an error on empty.
    pub async fn balance_history(&self, user_id: i64) -> Result<Vec<Operation>, AppError> {
        match self.repo.balance_history_get_by_id(user_id).await {
            Err(AppError::NotFound) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Hand the next queued operation of `op_type` to `transform`; see
    /// [`Repo::operation_update_further`].
    pub async fn update_further<F, Fut>(
        &self,
        op_type: OperationType,
        transform: F,
    ) -> Result<Operation, AppError>
    where
        F: FnOnce(Operation) -> Fut,
        Fut: Future<Output = Result<Operation, AppError>>,
    {
        self.repo.operation_update_further(op_type, transform).await
    }

    /// Admin path: create a promo campaign.
    pub async fn promo_create(&self, promo: &Promo) -> Result<Promo, AppError> {
        self.repo.promo_create(promo).await
    }
}

fn blank_operation(
    user_id: i64,
    op_type: OperationType,
    status: OperationStatus,
    amount: Decimal,
    description: String,
    order_number: Option<String>,
    promo_id: Option<i64>,
) -> Operation {
    let now = Utc::now();
    Operation {
        id: 0,
        user_id,
        op_type,
        status,
        amount,
        description,
        order_number,
        promo_id,
        created_at: now,
        updated_at: now,
    }
}

fn validate_order_number(order_number: &str) -> Result<(), AppError> {
    if order_number.is_empty() {
        return Err(AppError::BadRequest);
    }
    if order_number.len() > ORDER_NUMBER_MAX_LEN || !luhn::check(order_number) {
        return Err(AppError::OrderNumberInvalid);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_order_number() {
        assert!(validate_order_number("12345678903").is_ok());
        assert_eq!(validate_order_number(""), Err(AppError::BadRequest));
        assert_eq!(
            validate_order_number("invalid"),
            Err(AppError::OrderNumberInvalid)
        );
        assert_eq!(
            validate_order_number("12345678904"),
            Err(AppError::OrderNumberInvalid)
        );

        // over the length cap even if the checksum would pass
        let long = "0".repeat(513);
        assert_eq!(
            validate_order_number(&long),
            Err(AppError::OrderNumberInvalid)
        );
    }

    #[tokio::test]
    async fn test_withdrawal_amount_is_negated() {
        let svc = OperationService::new(Arc::new(Repo::new(
            sqlx::postgres::PgPoolOptions::new().connect_lazy("postgres://localhost").unwrap(),
        )));
        let op = svc
            .order_withdrawal_prepare(1, "2377225624", Decimal::new(40, 0))
            .unwrap();
        assert_eq!(op.amount, Decimal::new(-40, 0));
        assert_eq!(op.op_type, OperationType::OrderWithdrawal);
        assert_eq!(op.status, OperationStatus::New);
        assert_eq!(op.order_number.as_deref(), Some("2377225624"));
        assert!(op.promo_id.is_none());
    }

    #[tokio::test]
    async fn test_accrual_prepare_shape() {
        let svc = OperationService::new(Arc::new(Repo::new(
            sqlx::postgres::PgPoolOptions::new().connect_lazy("postgres://localhost").unwrap(),
        )));
        let op = svc.order_accrual_prepare(7, "12345678903").unwrap();
        assert_eq!(op.user_id, 7);
        assert_eq!(op.op_type, OperationType::OrderAccrual);
        assert_eq!(op.status, OperationStatus::New);
        assert_eq!(op.amount, Decimal::ZERO);
        assert!(op.description.contains("12345678903"));
    }
}
