/// Task store
///
/// Task CRUD scoped to group membership. Reads need any accepted role;
/// creating, editing and deleting need admin or contributor. Updates are
/// merge-patches.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::authorization::{self, Access};
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{CreateTask, Task, UpdateTask};

const MAX_TITLE_LEN: usize = 255;

fn validate_title(title: &str) -> ServiceResult<()> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("Task title is required".to_string()));
    }
    if title.trim().chars().count() > MAX_TITLE_LEN {
        return Err(ServiceError::Validation(format!(
            "Task title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }
    Ok(())
}

fn task_not_found() -> ServiceError {
    ServiceError::NotFound("Task".to_string())
}

#[derive(Clone)]
pub struct TaskStore {
    db: PgPool,
}

impl TaskStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Creates a pending task in `group_id`
    pub async fn create(&self, email: &str, group_id: Uuid, data: CreateTask) -> ServiceResult<Task> {
        validate_title(&data.title)?;
        let data = CreateTask {
            title: data.title.trim().to_string(),
            ..data
        };

        let mut tx = self.db.begin().await?;
        authorization::authorize(&mut *tx, email, group_id, Access::Write.roles()).await?;
        let task = Task::create(&mut *tx, group_id, &data).await?;
        tx.commit().await?;

        tracing::info!(task_id = %task.id, %group_id, by = %email, "Task created");
        Ok(task)
    }

    pub async fn get(&self, email: &str, task_id: Uuid) -> ServiceResult<Task> {
        let mut conn = self.db.acquire().await?;
        let task = Task::find_by_id(&mut *conn, task_id)
            .await?
            .ok_or_else(task_not_found)?;

        authorization::authorize(&mut conn, email, task.group_id, Access::Read.roles()).await?;
        Ok(task)
    }

    /// Applies a merge-patch; omitted fields keep their values
    pub async fn update(&self, email: &str, task_id: Uuid, patch: UpdateTask) -> ServiceResult<Task> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }
        let patch = UpdateTask {
            title: patch.title.map(|t| t.trim().to_string()),
            ..patch
        };

        let mut tx = self.db.begin().await?;
        let task = Task::find_for_update(&mut *tx, task_id)
            .await?
            .ok_or_else(task_not_found)?;

        authorization::authorize(&mut *tx, email, task.group_id, Access::Write.roles()).await?;

        let updated = if patch.is_empty() {
            task
        } else {
            Task::update(&mut *tx, task_id, &patch)
                .await?
                .ok_or_else(task_not_found)?
        };
        tx.commit().await?;

        tracing::info!(%task_id, by = %email, completed = updated.status, "Task updated");
        Ok(updated)
    }

    pub async fn delete(&self, email: &str, task_id: Uuid) -> ServiceResult<()> {
        let mut tx = self.db.begin().await?;
        let task = Task::find_for_update(&mut *tx, task_id)
            .await?
            .ok_or_else(task_not_found)?;

        authorization::authorize(&mut *tx, email, task.group_id, Access::Write.roles()).await?;

        Task::delete(&mut *tx, task_id).await?;
        tx.commit().await?;

        tracing::info!(%task_id, group_id = %task.group_id, by = %email, "Task deleted");
        Ok(())
    }

    /// Tasks across every group in which `email` is an accepted member
    pub async fn list_for_user(&self, email: &str) -> ServiceResult<Vec<Task>> {
        Ok(Task::list_for_user(&self.db, email).await?)
    }

    pub async fn list_for_group(&self, email: &str, group_id: Uuid) -> ServiceResult<Vec<Task>> {
        let mut conn = self.db.acquire().await?;
        authorization::authorize(&mut conn, email, group_id, Access::Read.roles()).await?;

        Ok(Task::list_by_group(&mut *conn, group_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Write report").is_ok());
        assert!(matches!(validate_title(""), Err(ServiceError::Validation(_))));
        assert!(matches!(validate_title("  \t"), Err(ServiceError::Validation(_))));
        assert!(validate_title(&"t".repeat(255)).is_ok());
        assert!(validate_title(&"t".repeat(256)).is_err());
    }
}
