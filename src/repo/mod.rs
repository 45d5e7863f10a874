//! Ledger storage engine
//!
//! All invariants live in the database as named constraints; this module
//! owns the transactions that touch them and the fixed translation from a
//! violated constraint to its domain error. Driver errors never leak to
//! callers: anything unrecognized becomes [`AppError::Internal`].

mod operations;
mod promos;
mod users;

use sqlx::PgPool;

use crate::errors::AppError;

/// Repository over the PostgreSQL ledger.
pub struct Repo {
    pool: PgPool,
}

impl Repo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Constraint-name to domain-error translation table.
fn constraint_error(name: &str) -> Option<AppError> {
    Some(match name {
        "login_unique" => AppError::LoginTaken,
        "balance_not_negative" => AppError::BalanceNegative,
        "withdrawn_not_negative" => AppError::WithdrawnNegative,

        "operation_valid_attrs" => AppError::AttrsInvalid,
        "amount_valid_sign" => AppError::AmountSignInvalid,
        "must_refs_user" => AppError::UserNotFound,
        "order_belongs_to_user" => AppError::OrderForeign,
        "order_unique_for_op_type" => AppError::OrderUsed,
        "must_refs_promo" => AppError::PromoNotFound,
        "promo_unique_for_user" => AppError::PromoUsed,

        "promo_code_unique" => AppError::PromoCodeTaken,
        "promo_reward_positive" => AppError::PromoRewardNotPositive,
        "promo_valid_period" => AppError::PromoPeriodInvalid,

        _ => return None,
    })
}

/// Map a driver error to the domain taxonomy.
pub(crate) fn map_db_err(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::NotFound,
        sqlx::Error::Database(dbe) => {
            if let Some(name) = dbe.constraint() {
                if let Some(mapped) = constraint_error(name) {
                    return mapped;
                }
                tracing::warn!(constraint = name, "unknown constraint violation");
            } else {
                tracing::error!(error = %dbe, "database error");
            }
            AppError::Internal
        }
        _ => {
            tracing::error!(error = %err, "storage error");
            AppError::Internal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_translation_table() {
        let cases = [
            ("login_unique", AppError::LoginTaken),
            ("balance_not_negative", AppError::BalanceNegative),
            ("withdrawn_not_negative", AppError::WithdrawnNegative),
            ("operation_valid_attrs", AppError::AttrsInvalid),
            ("amount_valid_sign", AppError::AmountSignInvalid),
            ("must_refs_user", AppError::UserNotFound),
            ("order_belongs_to_user", AppError::OrderForeign),
            ("order_unique_for_op_type", AppError::OrderUsed),
            ("must_refs_promo", AppError::PromoNotFound),
            ("promo_unique_for_user", AppError::PromoUsed),
            ("promo_code_unique", AppError::PromoCodeTaken),
            ("promo_reward_positive", AppError::PromoRewardNotPositive),
            ("promo_valid_period", AppError::PromoPeriodInvalid),
        ];
        for (name, want) in cases {
            assert_eq!(constraint_error(name), Some(want), "constraint {name}");
        }
        assert_eq!(constraint_error("users_pkey"), None);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(map_db_err(sqlx::Error::RowNotFound), AppError::NotFound);
    }
}
