//! Operation rows: the single-operation create transaction, the
//! skip-locked work-queue selector, and the ledger listings.

use std::future::Future;

use super::{Repo, map_db_err};
use crate::errors::AppError;
use crate::models::{Operation, OperationType};

const OPERATION_CREATE: &str = r#"
INSERT INTO operations (user_id, op_type, status, amount, description, order_number, promo_id)
VALUES ($1, $2, $3, $4, $5, $6, $7)
RETURNING id, user_id, op_type, status, amount, description, order_number, promo_id, created_at, updated_at
"#;

// Any operation type counts: one order number, one owner.
const OPERATION_ORDER_OWNER: &str = r#"
SELECT user_id FROM operations WHERE order_number = $1 LIMIT 1
"#;

// Oldest non-terminal operation of the given type; rows locked by peer
// transactions are skipped so workers never collide. Must run inside a
// transaction.
const OPERATION_LOCK_FURTHER: &str = r#"
SELECT id, user_id, op_type, status, amount, description, order_number, promo_id, created_at, updated_at
FROM operations
WHERE status IN ('NEW', 'PROCESSING') AND op_type = $1
ORDER BY updated_at
FOR UPDATE SKIP LOCKED
LIMIT 1
"#;

// Must run inside a transaction, after the user-row lock.
const OPERATION_UPDATE: &str = r#"
UPDATE operations
SET status = $2, amount = $3, updated_at = now()
WHERE id = $1
"#;

const OPERATION_GET_BY_TYPE: &str = r#"
SELECT id, user_id, op_type, status, amount, description, order_number, promo_id, created_at, updated_at
FROM operations
WHERE user_id = $1 AND op_type = $2
ORDER BY created_at DESC
"#;

// Only the operations that figure into the balance derivation:
// processed credits plus non-terminated debits.
const BALANCE_HISTORY_GET_BY_ID: &str = r#"
SELECT id, user_id, op_type, status, amount, description, order_number, promo_id, created_at, updated_at
FROM operations
WHERE user_id = $1
  AND ((status = 'PROCESSED' AND amount > 0)
    OR (status NOT IN ('INVALID', 'CANCELED') AND amount < 0))
ORDER BY updated_at DESC
"#;

impl Repo {
    /// Create an operation and atomically recompute the owner's balance.
    ///
    /// Lock order: user row first, then the insert; the new row is
    /// uncontended, so this never crosses the selector's operation-then-user
    /// ordering.
    pub async fn operation_create(&self, op: &Operation) -> Result<Operation, AppError> {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        Self::user_lock(&mut tx, op.user_id).await?;

        // Deterministic foreign-order answer; the exclusion constraint
        // backstops the cross-user race.
        if let Some(number) = op.order_number.as_deref() {
            let owner = sqlx::query_scalar::<_, i64>(OPERATION_ORDER_OWNER)
                .bind(number)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_db_err)?;
            if owner.is_some_and(|owner| owner != op.user_id) {
                return Err(AppError::OrderForeign);
            }
        }

        let stored = sqlx::query_as::<_, Operation>(OPERATION_CREATE)
            .bind(op.user_id)
            .bind(op.op_type)
            .bind(op.status)
            .bind(op.amount)
            .bind(&op.description)
            .bind(&op.order_number)
            .bind(op.promo_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_err)?;

        Self::user_recompute_balance(&mut tx, op.user_id).await?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::debug!(
            operation_id = stored.id,
            user_id = stored.user_id,
            "operation created"
        );
        Ok(stored)
    }

    /// Check out the oldest non-terminal operation of `op_type`, run
    /// `transform` on it, persist its new status and amount, and recompute
    /// the owner's balance, all in one transaction.
    ///
    /// Returns [`AppError::NotFound`] when no unlocked row qualifies. An
    /// error from `transform` aborts the transaction and is returned
    /// unchanged, so the row stays queued for a later tick.
    pub async fn operation_update_further<F, Fut>(
        &self,
        op_type: OperationType,
        transform: F,
    ) -> Result<Operation, AppError>
    where
        F: FnOnce(Operation) -> Fut,
        Fut: Future<Output = Result<Operation, AppError>>,
    {
        let mut tx = self.pool().begin().await.map_err(map_db_err)?;

        let Some(op) = sqlx::query_as::<_, Operation>(OPERATION_LOCK_FURTHER)
            .bind(op_type)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_err)?
        else {
            return Err(AppError::NotFound);
        };

        let prev_status = op.status;
        let op = transform(op).await?;

        if !prev_status.can_transit(op.status) {
            tracing::warn!(
                operation_id = op.id,
                from = ?prev_status,
                to = ?op.status,
                "transform produced an illegal status transition"
            );
            return Err(AppError::AttrsInvalid);
        }

        Self::user_lock(&mut tx, op.user_id).await?;

        sqlx::query(OPERATION_UPDATE)
            .bind(op.id)
            .bind(op.status)
            .bind(op.amount)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err)?;

        Self::user_recompute_balance(&mut tx, op.user_id).await?;

        tx.commit().await.map_err(map_db_err)?;

        tracing::debug!(operation_id = op.id, status = ?op.status, "operation advanced");
        Ok(op)
    }

    /// All operations of one type for a user, newest first. An empty list
    /// is not an error.
    pub async fn operation_get_by_type(
        &self,
        user_id: i64,
        op_type: OperationType,
    ) -> Result<Vec<Operation>, AppError> {
        sqlx::query_as::<_, Operation>(OPERATION_GET_BY_TYPE)
            .bind(user_id)
            .bind(op_type)
            .fetch_all(self.pool())
            .await
            .map_err(map_db_err)
    }

    /// The operations that influence the user's balance, most recently
    /// touched first.
    pub async fn balance_history_get_by_id(
        &self,
        user_id: i64,
    ) -> Result<Vec<Operation>, AppError> {
        sqlx::query_as::<_, Operation>(BALANCE_HISTORY_GET_BY_ID)
            .bind(user_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_db_err)
    }
}
