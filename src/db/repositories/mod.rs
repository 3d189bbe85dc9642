//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod task;
pub mod user;

pub use task::{SqlxTaskRepository, TaskRepository};
pub use user::{SqlxUserRepository, UserRepository};
