//! Task API endpoints
//!
//! - GET /tasks/ - list tasks with offset pagination
//! - GET /tasks/{id} - get a task by ID
//! - POST /tasks/ - create a task (write role)
//! - PUT /tasks/{id} - update a task (write role)
//! - DELETE /tasks/{id} - delete a task (write role)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{CreateTaskInput, Task, TaskPriority, TaskStatus, UpdateTaskInput};
use crate::services::task::TaskServiceError;

/// Query parameters for listing tasks
#[derive(Debug, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

/// Response for a single task
#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub reporter: String,
    pub assignee: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            reporter: task.reporter,
            assignee: task.assignee,
            status: task.status,
            priority: task.priority,
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

/// Request body for creating a task
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    pub reporter: String,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

/// Request body for updating a task (full replacement)
#[derive(Debug, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub description: String,
    pub reporter: String,
    #[serde(default)]
    pub assignee: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

fn map_task_error(e: TaskServiceError) -> ApiError {
    match e {
        TaskServiceError::NotFound(_) => ApiError::not_found("Task not found"),
        TaskServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        TaskServiceError::InternalError(e) => {
            tracing::error!("Internal error: {:#}", e);
            ApiError::internal_error("Internal server error")
        }
    }
}

/// GET /tasks/ - list tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let tasks = state
        .task_service
        .list(query.skip, query.limit)
        .await
        .map_err(map_task_error)?;

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// GET /tasks/{id} - get a task by ID
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.task_service.get(id).await.map_err(map_task_error)?;

    Ok(Json(task.into()))
}

/// POST /tasks/ - create a new task
pub async fn create_task(
    State(state): State<AppState>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    let input = CreateTaskInput {
        title: body.title,
        description: body.description,
        reporter: body.reporter,
        assignee: body.assignee,
        status: body.status,
        priority: body.priority,
    };

    let task = state
        .task_service
        .create(input)
        .await
        .map_err(map_task_error)?;

    Ok((StatusCode::CREATED, Json(task.into())))
}

/// PUT /tasks/{id} - update a task
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    let input = UpdateTaskInput {
        title: body.title,
        description: body.description,
        reporter: body.reporter,
        assignee: body.assignee,
        status: body.status,
        priority: body.priority,
    };

    let task = state
        .task_service
        .update(id, input)
        .await
        .map_err(map_task_error)?;

    Ok(Json(task.into()))
}

/// DELETE /tasks/{id} - delete a task, returning the deleted record
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state
        .task_service
        .delete(id)
        .await
        .map_err(map_task_error)?;

    Ok(Json(task.into()))
}
