/// Account signup
///
/// Signup validates input without touching the store and hashes the password
/// on the blocking pool, then runs one transaction: duplicate-email check,
/// license redemption, user insert, commit. Any failure drops the
/// transaction, so a license is never burned by a signup that did not
/// complete.

use sqlx::PgPool;

use super::licenses::LicenseLedger;
use crate::auth::password::{hash_password, validate_email, validate_password_strength};
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::{normalize_email, User};

/// Runs Argon2id on the blocking pool
async fn hash_off_thread(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| {
            tracing::error!(error = %e, "Password hashing failed");
            ServiceError::Internal("Password hashing failed".to_string())
        })
}

#[derive(Clone)]
pub struct AccountService {
    db: PgPool,
}

impl AccountService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Registers a new account, consuming `license_key`
    ///
    /// # Errors
    ///
    /// - `Validation`: bad email format or weak password
    /// - `Conflict`: email already registered, or license already used
    /// - `NotFound`: license key does not exist
    pub async fn signup(&self, email: &str, password: &str, license_key: &str) -> ServiceResult<User> {
        validate_email(email.trim()).map_err(ServiceError::Validation)?;
        validate_password_strength(password).map_err(ServiceError::Validation)?;

        let email = normalize_email(email);
        let password_hash = hash_off_thread(password.to_string()).await?;

        let mut tx = self.db.begin().await?;

        if User::exists(&mut *tx, &email).await? {
            tracing::warn!(%email, "Signup for an already registered email");
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }

        LicenseLedger::redeem(&mut tx, license_key).await?;

        let user = User::create(&mut *tx, &email, &password_hash).await?;
        tx.commit().await?;

        tracing::info!(email = %user.email, "User registered");
        Ok(user)
    }
}
