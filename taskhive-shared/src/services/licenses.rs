/// License ledger
///
/// Single-use signup licenses. Redemption runs inside the caller's
/// transaction and takes an exclusive row lock before reading `used_status`,
/// so two signups racing on the same key cannot both pass the check: the
/// second blocks on the lock and then sees the key as used. If the caller's
/// transaction rolls back, the key is unburned.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::services::licenses::LicenseLedger;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = LicenseLedger::new(pool.clone());
/// let key = ledger.issue().await?;
///
/// let mut tx = pool.begin().await?;
/// LicenseLedger::redeem(&mut tx, &key).await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

use rand::Rng;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use crate::error::{ServiceError, ServiceResult};
use crate::models::license::SoftwareLicense;

/// Prefix of every generated license key
pub const LICENSE_KEY_PREFIX: &str = "LIC-";

/// Length of the random part of a generated key
const LICENSE_KEY_RANDOM_LENGTH: usize = 24;

#[derive(Debug, Error)]
pub enum LicenseError {
    #[error("Invalid software license")]
    Invalid,

    #[error("Software license already used")]
    AlreadyUsed,

    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<LicenseError> for ServiceError {
    fn from(err: LicenseError) -> Self {
        match err {
            LicenseError::Invalid => ServiceError::NotFound("Software license".to_string()),
            LicenseError::AlreadyUsed => ServiceError::Conflict(err.to_string()),
            LicenseError::Storage(e) => ServiceError::from(e),
        }
    }
}

/// Generates a fresh key: `LIC-` followed by 24 base62 characters
pub fn generate_license_key() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();

    let random_part: String = (0..LICENSE_KEY_RANDOM_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    format!("{}{}", LICENSE_KEY_PREFIX, random_part)
}

#[derive(Clone)]
pub struct LicenseLedger {
    db: PgPool,
}

impl LicenseLedger {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Mints and stores a new unused license
    pub async fn issue(&self) -> ServiceResult<String> {
        let key = generate_license_key();
        SoftwareLicense::create(&self.db, &key).await?;

        let key_prefix = &key[..LICENSE_KEY_PREFIX.len() + 4];
        tracing::info!(%key_prefix, "License issued");
        Ok(key)
    }

    /// Claims `key` inside the caller's transaction
    ///
    /// Locks the license row, checks it is unused and flips `used_status`.
    /// The flip only becomes visible when the caller commits.
    pub async fn redeem(conn: &mut PgConnection, key: &str) -> Result<(), LicenseError> {
        let license = SoftwareLicense::find_for_update(&mut *conn, key)
            .await?
            .ok_or(LicenseError::Invalid)?;

        if license.used_status {
            tracing::warn!("Attempt to redeem an already used license");
            return Err(LicenseError::AlreadyUsed);
        }

        if !SoftwareLicense::mark_used(&mut *conn, key).await? {
            return Err(LicenseError::AlreadyUsed);
        }

        tracing::info!("License redeemed");
        Ok(())
    }
}
