//! Promo rows: creation and code lookup.

use super::{Repo, map_db_err};
use crate::errors::AppError;
use crate::models::Promo;

const PROMO_CREATE: &str = r#"
INSERT INTO promos (code, description, reward, not_before, not_after)
VALUES ($1, $2, $3, $4, $5)
RETURNING id, code, description, reward, not_before, not_after, created_at
"#;

const PROMO_GET_BY_CODE: &str = r#"
SELECT id, code, description, reward, not_before, not_after, created_at
FROM promos
WHERE code = $1
"#;

impl Repo {
    /// Create a promo campaign. Reward positivity and period validity are
    /// enforced by the schema.
    pub async fn promo_create(&self, promo: &Promo) -> Result<Promo, AppError> {
        let stored = sqlx::query_as::<_, Promo>(PROMO_CREATE)
            .bind(&promo.code)
            .bind(&promo.description)
            .bind(promo.reward)
            .bind(promo.not_before)
            .bind(promo.not_after)
            .fetch_one(self.pool())
            .await
            .map_err(map_db_err)?;
        tracing::debug!(promo_id = stored.id, code = %stored.code, "promo created");
        Ok(stored)
    }

    pub async fn promo_get_by_code(&self, code: &str) -> Result<Promo, AppError> {
        sqlx::query_as::<_, Promo>(PROMO_GET_BY_CODE)
            .bind(code)
            .fetch_optional(self.pool())
            .await
            .map_err(map_db_err)?
            .ok_or(AppError::NotFound)
    }
}
