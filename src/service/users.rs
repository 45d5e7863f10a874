//! User registration and credential checks.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;
use crate::models::User;
use crate::repo::Repo;

/// First character alphanumeric, the rest from a small safe set, 3-64 total.
static LOGIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._\-@ ]{2,63}$").unwrap());

const PASSWORD_MIN_LEN: usize = 6;
const PASSWORD_MAX_LEN: usize = 512;

pub struct UserService {
    repo: Arc<Repo>,
}

impl UserService {
    pub fn new(repo: Arc<Repo>) -> Self {
        Self { repo }
    }

    /// Validate credentials, hash the password and create the account.
    pub async fn register(&self, login: &str, password: &str) -> Result<User, AppError> {
        validate_login(login)?;
        validate_password(password)?;

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST).map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AppError::Internal
        })?;

        let user = self.repo.user_create(login, &hash).await?;
        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// Verify a login/password pair. Unknown login and wrong password are
    /// indistinguishable to the caller.
    pub async fn check_login_pass(&self, login: &str, password: &str) -> Result<User, AppError> {
        let user = match self.repo.user_get_by_login(login).await {
            Ok(user) => user,
            Err(AppError::NotFound) => return Err(AppError::LoginPassMismatch),
            Err(e) => return Err(e),
        };

        let matched = bcrypt::verify(password, &user.pass_hash).map_err(|e| {
            tracing::error!(error = %e, "password verification failed");
            AppError::Internal
        })?;
        if !matched {
            return Err(AppError::LoginPassMismatch);
        }

        tracing::debug!(user_id = user.id, "password matched");
        Ok(user)
    }

    pub async fn get_by_id(&self, user_id: i64) -> Result<User, AppError> {
        self.repo.user_get_by_id(user_id).await
    }
}

fn validate_login(login: &str) -> Result<(), AppError> {
    if !LOGIN_RE.is_match(login) {
        return Err(AppError::LoginInvalid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(AppError::PasswordInvalid);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_login() {
        let at_cap = "a".repeat(64);
        let over_cap = "a".repeat(65);
        let cases = [
            ("oleg", true),
            ("ol", false),
            ("", false),
            ("a23", true),
            ("oleg the great", true),
            ("user@example.com", true),
            (".oleg", false),
            ("-oleg", false),
            ("oleg!", false),
            (at_cap.as_str(), true),
            (over_cap.as_str(), false),
        ];
        for (login, ok) in cases {
            assert_eq!(validate_login(login).is_ok(), ok, "login {login:?}");
        }
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Qwerty123456!").is_ok());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
        assert!(validate_password("").is_err());
        assert!(validate_password(&"p".repeat(512)).is_ok());
        assert!(validate_password(&"p".repeat(513)).is_err());
    }
}
