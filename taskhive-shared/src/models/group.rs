/// Group model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE groups (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     description TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Deleting a group cascades to its memberships and tasks through foreign
/// keys, but the membership engine deletes those rows explicitly inside the
/// leave transaction so the cleanup is visible in the logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// A collaboration group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
    /// Unique group ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Optional free-form description
    pub description: Option<String>,

    /// When the group was created
    pub created_at: DateTime<Utc>,
}

/// Fields that may be changed on an existing group
///
/// `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGroup {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateGroup {
    /// True if the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

impl Group {
    /// Inserts a new group
    pub async fn create<'e, E>(
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
    }

    /// Finds a group by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Group>(
            "SELECT id, name, description, created_at FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Locks the group row for the rest of the transaction
    ///
    /// Concurrent leave operations on the same group serialize on this lock.
    pub async fn lock_for_update<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Group>(
            "SELECT id, name, description, created_at FROM groups WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Applies a merge-patch to the group
    ///
    /// Returns `None` if the group does not exist.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        patch: &UpdateGroup,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(id)
        .bind(patch.name.as_deref())
        .bind(patch.description.as_deref())
        .fetch_optional(executor)
        .await
    }

    /// Deletes a group, returning whether a row was removed
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the groups in which `email` holds an accepted membership
    pub async fn list_for_user<'e, E>(executor: E, email: &str) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Group>(
            r#"
            SELECT g.id, g.name, g.description, g.created_at
            FROM groups g
            INNER JOIN memberships m ON m.group_id = g.id
            WHERE m.user_email = $1 AND m.status = 'accepted'
            ORDER BY g.created_at ASC
            "#,
        )
        .bind(email)
        .fetch_all(executor)
        .await
    }
}
