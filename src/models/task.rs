//! Task model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task entity.
///
/// Reporter and assignee are stored as user email addresses; the assignee
/// is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: i64,
    /// Task title
    pub title: String,
    /// Task description
    pub description: String,
    /// Email of the reporting user
    pub reporter: String,
    /// Email of the assigned user, if any
    pub assignee: Option<String>,
    /// Task status
    pub status: TaskStatus,
    /// Task priority
    pub priority: TaskPriority,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in progress")]
    InProgress,
    #[serde(rename = "done")]
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Todo
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Todo => write!(f, "todo"),
            TaskStatus::InProgress => write!(f, "in progress"),
            TaskStatus::Done => write!(f, "done"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Highest,
    High,
    Medium,
    Low,
    Lowest,
}

impl Default for TaskPriority {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Highest => write!(f, "highest"),
            TaskPriority::High => write!(f, "high"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Lowest => write!(f, "lowest"),
        }
    }
}

impl FromStr for TaskPriority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "highest" => Ok(TaskPriority::Highest),
            "high" => Ok(TaskPriority::High),
            "medium" => Ok(TaskPriority::Medium),
            "low" => Ok(TaskPriority::Low),
            "lowest" => Ok(TaskPriority::Lowest),
            _ => Err(anyhow::anyhow!("Invalid task priority: {}", s)),
        }
    }
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTaskInput {
    pub title: String,
    pub description: String,
    pub reporter: String,
    pub assignee: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

/// Input for updating a task (full replacement)
#[derive(Debug, Clone)]
pub struct UpdateTaskInput {
    pub title: String,
    pub description: String,
    pub reporter: String,
    pub assignee: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(TaskStatus::Todo.to_string(), "todo");
        assert_eq!(TaskStatus::InProgress.to_string(), "in progress");
        assert_eq!(TaskStatus::Done.to_string(), "done");
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(TaskStatus::from_str("todo").unwrap(), TaskStatus::Todo);
        assert_eq!(
            TaskStatus::from_str("in progress").unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(TaskStatus::from_str("Done").unwrap(), TaskStatus::Done);
        assert!(TaskStatus::from_str("archived").is_err());
    }

    #[test]
    fn test_status_serde_uses_display_values() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in progress\"");
        let back: TaskStatus = serde_json::from_str("\"in progress\"").unwrap();
        assert_eq!(back, TaskStatus::InProgress);
    }

    #[test]
    fn test_priority_display_and_parse() {
        for p in [
            TaskPriority::Highest,
            TaskPriority::High,
            TaskPriority::Medium,
            TaskPriority::Low,
            TaskPriority::Lowest,
        ] {
            assert_eq!(TaskPriority::from_str(&p.to_string()).unwrap(), p);
        }
        assert!(TaskPriority::from_str("urgent").is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }
}
