//! Task repository
//!
//! Database operations for tasks.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Task, TaskPriority, TaskStatus};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Task repository trait
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Create a new task
    async fn create(&self, task: &Task) -> Result<Task>;

    /// Get task by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Task>>;

    /// List tasks with offset-based pagination
    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Task>>;

    /// Update a task
    async fn update(&self, task: &Task) -> Result<Task>;

    /// Delete a task
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based task repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTaskRepository {
    pool: DynDatabasePool,
}

impl SqlxTaskRepository {
    /// Create a new SQLx task repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a shared repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TaskRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TaskRepository for SqlxTaskRepository {
    async fn create(&self, task: &Task) -> Result<Task> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_task_sqlite(self.pool.as_sqlite().unwrap(), task).await,
            DatabaseDriver::Mysql => create_task_mysql(self.pool.as_mysql().unwrap(), task).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Task>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_task_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_task_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list(&self, skip: i64, limit: i64) -> Result<Vec<Task>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_tasks_sqlite(self.pool.as_sqlite().unwrap(), skip, limit).await
            }
            DatabaseDriver::Mysql => {
                list_tasks_mysql(self.pool.as_mysql().unwrap(), skip, limit).await
            }
        }
    }

    async fn update(&self, task: &Task) -> Result<Task> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_task_sqlite(self.pool.as_sqlite().unwrap(), task).await,
            DatabaseDriver::Mysql => update_task_mysql(self.pool.as_mysql().unwrap(), task).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_task_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_task_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_task_sqlite(pool: &SqlitePool, task: &Task) -> Result<Task> {
    let now = Utc::now();
    let status_str = task.status.to_string();
    let priority_str = task.priority.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (title, description, reporter, assignee, status, priority, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.reporter)
    .bind(&task.assignee)
    .bind(&status_str)
    .bind(&priority_str)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create task")?;

    let id = result.last_insert_rowid();

    Ok(Task {
        id,
        title: task.title.clone(),
        description: task.description.clone(),
        reporter: task.reporter.clone(),
        assignee: task.assignee.clone(),
        status: task.status,
        priority: task.priority,
        created_at: now,
        updated_at: now,
    })
}

async fn get_task_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Task>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, description, reporter, assignee, status, priority, created_at, updated_at
        FROM tasks
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get task by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_task_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_tasks_sqlite(pool: &SqlitePool, skip: i64, limit: i64) -> Result<Vec<Task>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, description, reporter, assignee, status, priority, created_at, updated_at
        FROM tasks
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
    .context("Failed to list tasks")?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row_to_task_sqlite(&row)?);
    }
    Ok(tasks)
}

async fn update_task_sqlite(pool: &SqlitePool, task: &Task) -> Result<Task> {
    let now = Utc::now();
    let status_str = task.status.to_string();
    let priority_str = task.priority.to_string();

    sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?, description = ?, reporter = ?, assignee = ?, status = ?, priority = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.reporter)
    .bind(&task.assignee)
    .bind(&status_str)
    .bind(&priority_str)
    .bind(now)
    .bind(task.id)
    .execute(pool)
    .await
    .context("Failed to update task")?;

    get_task_by_id_sqlite(pool, task.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Task not found after update"))
}

async fn delete_task_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete task")?;

    Ok(())
}

fn row_to_task_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Task> {
    let status_str: String = row.get("status");
    let status = TaskStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    let priority_str: String = row.get("priority");
    let priority = TaskPriority::from_str(&priority_str)
        .with_context(|| format!("Invalid priority in database: {}", priority_str))?;

    Ok(Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        reporter: row.get("reporter"),
        assignee: row.get("assignee"),
        status,
        priority,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_task_mysql(pool: &MySqlPool, task: &Task) -> Result<Task> {
    let now = Utc::now();
    let status_str = task.status.to_string();
    let priority_str = task.priority.to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO tasks (title, description, reporter, assignee, status, priority, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.reporter)
    .bind(&task.assignee)
    .bind(&status_str)
    .bind(&priority_str)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create task")?;

    let id = result.last_insert_id() as i64;

    Ok(Task {
        id,
        title: task.title.clone(),
        description: task.description.clone(),
        reporter: task.reporter.clone(),
        assignee: task.assignee.clone(),
        status: task.status,
        priority: task.priority,
        created_at: now,
        updated_at: now,
    })
}

async fn get_task_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Task>> {
    let row = sqlx::query(
        r#"
        SELECT id, title, description, reporter, assignee, status, priority, created_at, updated_at
        FROM tasks
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get task by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_task_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_tasks_mysql(pool: &MySqlPool, skip: i64, limit: i64) -> Result<Vec<Task>> {
    let rows = sqlx::query(
        r#"
        SELECT id, title, description, reporter, assignee, status, priority, created_at, updated_at
        FROM tasks
        ORDER BY id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
    .context("Failed to list tasks")?;

    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row_to_task_mysql(&row)?);
    }
    Ok(tasks)
}

async fn update_task_mysql(pool: &MySqlPool, task: &Task) -> Result<Task> {
    let now = Utc::now();
    let status_str = task.status.to_string();
    let priority_str = task.priority.to_string();

    sqlx::query(
        r#"
        UPDATE tasks
        SET title = ?, description = ?, reporter = ?, assignee = ?, status = ?, priority = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.reporter)
    .bind(&task.assignee)
    .bind(&status_str)
    .bind(&priority_str)
    .bind(now)
    .bind(task.id)
    .execute(pool)
    .await
    .context("Failed to update task")?;

    get_task_by_id_mysql(pool, task.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Task not found after update"))
}

async fn delete_task_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete task")?;

    Ok(())
}

fn row_to_task_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Task> {
    let status_str: String = row.get("status");
    let status = TaskStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;

    let priority_str: String = row.get("priority");
    let priority = TaskPriority::from_str(&priority_str)
        .with_context(|| format!("Invalid priority in database: {}", priority_str))?;

    Ok(Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        reporter: row.get("reporter"),
        assignee: row.get("assignee"),
        status,
        priority,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
