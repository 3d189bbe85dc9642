//! Task service
//!
//! Business logic for task management: CRUD with validation, plus the
//! status-change notification to the task's reporter.

use crate::db::repositories::TaskRepository;
use crate::models::{CreateTaskInput, Task, UpdateTaskInput};
use crate::services::notify::Notifier;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for task service operations
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// Task not found
    #[error("Task not found: {0}")]
    NotFound(i64),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Task service
pub struct TaskService {
    repo: Arc<dyn TaskRepository>,
    notifier: Arc<dyn Notifier>,
}

impl TaskService {
    /// Create a new task service
    pub fn new(repo: Arc<dyn TaskRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self { repo, notifier }
    }

    /// Create a new task
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the title or reporter is empty
    pub async fn create(&self, input: CreateTaskInput) -> Result<Task, TaskServiceError> {
        validate_title(&input.title)?;
        validate_reporter(&input.reporter)?;

        let now = Utc::now();
        let task = Task {
            id: 0, // Assigned by the database
            title: input.title,
            description: input.description,
            reporter: input.reporter,
            assignee: input.assignee,
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let created = self
            .repo
            .create(&task)
            .await
            .context("Failed to create task")?;

        tracing::debug!("Created task {} '{}'", created.id, created.title);

        Ok(created)
    }

    /// Get a task by ID
    pub async fn get(&self, id: i64) -> Result<Task, TaskServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get task")?
            .ok_or(TaskServiceError::NotFound(id))
    }

    /// List tasks with offset-based pagination
    pub async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Task>, TaskServiceError> {
        let tasks = self
            .repo
            .list(skip, limit)
            .await
            .context("Failed to list tasks")?;

        Ok(tasks)
    }

    /// Update a task (full replacement).
    ///
    /// If the update changes the task's status, the reporter is notified.
    pub async fn update(&self, id: i64, input: UpdateTaskInput) -> Result<Task, TaskServiceError> {
        validate_title(&input.title)?;
        validate_reporter(&input.reporter)?;

        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get task")?
            .ok_or(TaskServiceError::NotFound(id))?;

        let old_status = existing.status;

        let task = Task {
            id: existing.id,
            title: input.title,
            description: input.description,
            reporter: input.reporter,
            assignee: input.assignee,
            status: input.status,
            priority: input.priority,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        let updated = self
            .repo
            .update(&task)
            .await
            .context("Failed to update task")?;

        if old_status != updated.status {
            self.notifier.task_status_changed(&updated);
        }

        Ok(updated)
    }

    /// Delete a task, returning the deleted record.
    pub async fn delete(&self, id: i64) -> Result<Task, TaskServiceError> {
        let existing = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get task")?
            .ok_or(TaskServiceError::NotFound(id))?;

        self.repo
            .delete(id)
            .await
            .context("Failed to delete task")?;

        tracing::debug!("Deleted task {}", id);

        Ok(existing)
    }
}

fn validate_title(title: &str) -> Result<(), TaskServiceError> {
    if title.trim().is_empty() {
        return Err(TaskServiceError::ValidationError(
            "Title cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_reporter(reporter: &str) -> Result<(), TaskServiceError> {
    if reporter.trim().is_empty() {
        return Err(TaskServiceError::ValidationError(
            "Reporter cannot be empty".to_string(),
        ));
    }
    Ok(())
}
