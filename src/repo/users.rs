//! User rows: creation, lookup, locking and the balance recompute.

use sqlx::PgConnection;

use super::{Repo, map_db_err};
use crate::errors::AppError;
use crate::models::User;

const USER_CREATE: &str = r#"
INSERT INTO users (login, pass_hash)
VALUES ($1, $2)
RETURNING id, login, pass_hash, balance, withdrawn, created_at, updated_at
"#;

const USER_GET_BY_ID: &str = r#"
SELECT id, login, pass_hash, balance, withdrawn, created_at, updated_at
FROM users
WHERE id = $1
"#;

const USER_GET_BY_LOGIN: &str = r#"
SELECT id, login, pass_hash, balance, withdrawn, created_at, updated_at
FROM users
WHERE login = $1
"#;

// Must run inside a transaction.
const USER_LOCK: &str = "SELECT id FROM users WHERE id = $1 FOR UPDATE";

// Derived assignment, not a delta: replaces balance and withdrawn with the
// totals over the user's operations visible in this transaction. Must run
// inside a transaction, after USER_LOCK.
const USER_RECOMPUTE_BALANCE: &str = r#"
WITH total_accrued AS (
    SELECT coalesce(sum(amount), 0) AS val
    FROM operations
    WHERE user_id = $1 AND status = 'PROCESSED' AND amount > 0
),
     total_withdrawn AS (
         SELECT coalesce(sum(amount), 0) AS val
         FROM operations
         WHERE user_id = $1 AND status NOT IN ('INVALID', 'CANCELED') AND amount < 0
     )
UPDATE users
SET balance    = total_accrued.val + total_withdrawn.val,
    withdrawn  = 0 - total_withdrawn.val,
    updated_at = now()
FROM total_accrued,
     total_withdrawn
WHERE id = $1
"#;

impl Repo {
    /// Create a user from a login and password hash.
    pub async fn user_create(&self, login: &str, pass_hash: &str) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(USER_CREATE)
            .bind(login)
            .bind(pass_hash)
            .fetch_one(self.pool())
            .await
            .map_err(map_db_err)?;
        tracing::debug!(user_id = user.id, "user created");
        Ok(user)
    }

    pub async fn user_get_by_id(&self, user_id: i64) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(USER_GET_BY_ID)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_db_err)?
            .ok_or(AppError::NotFound)
    }

    pub async fn user_get_by_login(&self, login: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(USER_GET_BY_LOGIN)
            .bind(login)
            .fetch_optional(self.pool())
            .await
            .map_err(map_db_err)?
            .ok_or(AppError::NotFound)
    }

    /// Acquire an exclusive lock on the user row for the rest of the
    /// surrounding transaction.
    pub(super) async fn user_lock(conn: &mut PgConnection, user_id: i64) -> Result<(), AppError> {
        sqlx::query(USER_LOCK)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_err)?
            .map(|_| ())
            .ok_or(AppError::UserNotFound)
    }

    /// Recompute `balance` and `withdrawn` from the user's operations.
    /// The caller must hold the user-row lock.
    pub(super) async fn user_recompute_balance(
        conn: &mut PgConnection,
        user_id: i64,
    ) -> Result<(), AppError> {
        let result = sqlx::query(USER_RECOMPUTE_BALANCE)
            .bind(user_id)
            .execute(&mut *conn)
            .await
            .map_err(map_db_err)?;
        if result.rows_affected() != 1 {
            tracing::error!(user_id, "balance recompute touched no row");
            return Err(AppError::Internal);
        }
        Ok(())
    }
}
