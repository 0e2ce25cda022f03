/// Software license model
///
/// Every signup consumes one license key. Keys are single-use: `used_status`
/// flips from `false` to `true` exactly once and never back.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE software_licenses (
///     key TEXT PRIMARY KEY,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     used_status BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SoftwareLicense {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub used_status: bool,
}

impl SoftwareLicense {
    /// Inserts a new unused license
    pub async fn create<'e, E>(executor: E, key: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, SoftwareLicense>(
            r#"
            INSERT INTO software_licenses (key)
            VALUES ($1)
            RETURNING key, created_at, used_status
            "#,
        )
        .bind(key)
        .fetch_one(executor)
        .await
    }

    pub async fn find<'e, E>(executor: E, key: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, SoftwareLicense>(
            "SELECT key, created_at, used_status FROM software_licenses WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(executor)
        .await
    }

    /// Reads the license and takes an exclusive row lock on it
    ///
    /// A second transaction locking the same key blocks until the first one
    /// commits or rolls back, then observes its outcome.
    pub async fn find_for_update<'e, E>(executor: E, key: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, SoftwareLicense>(
            r#"
            SELECT key, created_at, used_status
            FROM software_licenses
            WHERE key = $1
            FOR UPDATE
            "#,
        )
        .bind(key)
        .fetch_optional(executor)
        .await
    }

    /// Flags the license as used
    ///
    /// Only an unused row is updated, so a second call returns `false`.
    pub async fn mark_used<'e, E>(executor: E, key: &str) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE software_licenses SET used_status = TRUE WHERE key = $1 AND used_status = FALSE",
        )
        .bind(key)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
