/// Task endpoints
///
/// Reads need an accepted membership in the task's group; creating,
/// editing and deleting need admin or contributor.

use crate::{
    app::AppState,
    error::ApiResult,
    middleware::auth::AuthContext,
    views::{self, TaskView},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskhive_shared::models::task::{CreateTask, UpdateTask};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub group_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Task title must be 1-255 characters"))]
    pub title: String,

    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Merge-patch body; omitted fields keep their stored value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 255, message = "Task title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,

    /// `true` marks the task completed
    pub status: Option<bool>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: req.title,
            description: req.description,
            due_date: req.due_date,
            status: req.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub task: TaskView,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Tasks across every group the caller belongs to
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = state.tasks.list_for_user(auth.email()).await?;

    Ok(Json(TaskListResponse {
        tasks: views::many(&tasks),
    }))
}

pub async fn list_group_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(group_id): Path<Uuid>,
) -> ApiResult<Json<TaskListResponse>> {
    let tasks = state.tasks.list_for_group(auth.email(), group_id).await?;

    Ok(Json(TaskListResponse {
        tasks: views::many(&tasks),
    }))
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    req.validate()?;

    let data = CreateTask {
        title: req.title,
        description: req.description,
        due_date: req.due_date,
    };
    let task = state.tasks.create(auth.email(), req.group_id, data).await?;

    Ok((
        StatusCode::CREATED,
        Json(TaskResponse {
            task: TaskView::from(&task),
        }),
    ))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let task = state.tasks.get(auth.email(), task_id).await?;

    Ok(Json(TaskResponse {
        task: TaskView::from(&task),
    }))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    req.validate()?;

    let task = state.tasks.update(auth.email(), task_id, req.into()).await?;

    Ok(Json(TaskResponse {
        task: TaskView::from(&task),
    }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    state.tasks.delete(auth.email(), task_id).await?;

    Ok(Json(MessageResponse {
        message: "Task deleted".to_string(),
    }))
}
