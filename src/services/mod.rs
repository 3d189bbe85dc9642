//! Services layer - Business logic
//!
//! Services implement business rules and coordinate between repositories and
//! the HTTP layer: credential handling, token issuance/verification, and
//! task management.

pub mod notify;
pub mod password;
pub mod task;
pub mod token;
pub mod user;

pub use notify::{LogNotifier, Notifier};
pub use password::{hash_password, verify_password};
pub use task::{TaskService, TaskServiceError};
pub use token::{TokenCodec, TokenError, TOKEN_TTL_MINUTES};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
