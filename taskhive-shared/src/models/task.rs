/// Task model and database operations
///
/// Tasks belong to exactly one group; every read and write goes through the
/// membership gate in `auth::authorization` first.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT,
///     group_id UUID NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     due_date TIMESTAMPTZ,
///     status BOOLEAN NOT NULL DEFAULT FALSE
/// );
/// ```
///
/// `status` is `false` while the task is pending and `true` once completed.
///
/// # Example
///
/// ```no_run
/// use taskhive_shared::models::task::{CreateTask, Task, UpdateTask};
/// use taskhive_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, Uuid::new_v4(), &CreateTask {
///     title: "Write report".to_string(),
///     description: None,
///     due_date: None,
/// }).await?;
///
/// let done = UpdateTask { status: Some(true), ..Default::default() };
/// Task::update(&pool, task.id, &done).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// A unit of work inside a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub group_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,

    /// `false` = pending, `true` = completed
    pub status: bool,
}

impl Task {
    /// Human-readable status
    pub fn status_label(&self) -> &'static str {
        if self.status {
            "completed"
        } else {
            "pending"
        }
    }
}

/// Input for creating a task; new tasks always start pending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Merge-patch for an existing task
///
/// Fields left as `None` keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<bool>,
}

impl UpdateTask {
    /// True if the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }
}

impl Task {
    /// Inserts a new pending task into `group_id`
    pub async fn create<'e, E>(executor: E, group_id: Uuid, data: &CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, title, description, group_id, due_date, status)
            VALUES ($1, $2, $3, $4, $5, FALSE)
            RETURNING id, title, description, group_id, created_at, due_date, status
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(data.description.as_deref())
        .bind(group_id)
        .bind(data.due_date)
        .fetch_one(executor)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, group_id, created_at, due_date, status
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Finds a task and locks its row for the rest of the transaction
    pub async fn find_for_update<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, group_id, created_at, due_date, status
            FROM tasks
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Applies a merge-patch, returning `None` if the task does not exist
    pub async fn update<'e, E>(executor: E, id: Uuid, patch: &UpdateTask) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                due_date = COALESCE($4, due_date),
                status = COALESCE($5, status)
            WHERE id = $1
            RETURNING id, title, description, group_id, created_at, due_date, status
            "#,
        )
        .bind(id)
        .bind(patch.title.as_deref())
        .bind(patch.description.as_deref())
        .bind(patch.due_date)
        .bind(patch.status)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a task, returning whether a row was removed
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task of a group, returning how many were removed
    pub async fn delete_by_group<'e, E>(executor: E, group_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE group_id = $1")
            .bind(group_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Tasks of every group in which `email` is an accepted member
    pub async fn list_for_user<'e, E>(executor: E, email: &str) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.group_id, t.created_at, t.due_date, t.status
            FROM tasks t
            INNER JOIN memberships m ON m.group_id = t.group_id
            WHERE m.user_email = $1 AND m.status = 'accepted'
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(email)
        .fetch_all(executor)
        .await
    }

    /// Tasks of a single group
    pub async fn list_by_group<'e, E>(executor: E, group_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, description, group_id, created_at, due_date, status
            FROM tasks
            WHERE group_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(executor)
        .await
    }
}
