//! User model
//!
//! Defines the User entity, the closed role enumeration, and the role
//! predicate used to gate write operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered account.
///
/// The role is fixed at creation; there is no promotion or demotion flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique, login subject and token subject)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: Role,
    /// Whether the account may access the system
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(email: String, password_hash: String, role: Role) -> Self {
        Self {
            id: 0, // Assigned by the database
            email,
            password_hash,
            role,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Check if the user's role permits the given operation
    pub fn can(&self, op: Operation) -> bool {
        self.role.allows(op)
    }
}

/// The kind of operation a request performs, for authorization purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Read a task or list tasks
    Read,
    /// Create, update, or delete a task
    Write,
}

/// User role for authorization.
///
/// Roles are a closed enumeration; the permission split is expressed as a
/// single predicate over (role, operation) rather than a type hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrator - all operations
    Admin,
    /// Read-only - read operations only
    ReadOnly,
}

impl Role {
    /// The role predicate: which operations does this role permit?
    pub fn allows(self, op: Operation) -> bool {
        match (self, op) {
            (Role::Admin, _) => true,
            (Role::ReadOnly, Operation::Read) => true,
            (Role::ReadOnly, Operation::Write) => false,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::ReadOnly
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::ReadOnly => write!(f, "read_only"),
        }
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "read_only" => Ok(Role::ReadOnly),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "test@example.com".to_string(),
            "hashed_password".to_string(),
            Role::ReadOnly,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.email, "test@example.com");
        assert_eq!(user.role, Role::ReadOnly);
        assert!(user.is_active);
    }

    #[test]
    fn test_user_is_admin() {
        let admin = User::new("a@test.com".to_string(), "hash".to_string(), Role::Admin);
        let reader = User::new("r@test.com".to_string(), "hash".to_string(), Role::ReadOnly);

        assert!(admin.is_admin());
        assert!(!reader.is_admin());
    }

    #[test]
    fn test_role_predicate() {
        assert!(Role::Admin.allows(Operation::Read));
        assert!(Role::Admin.allows(Operation::Write));
        assert!(Role::ReadOnly.allows(Operation::Read));
        assert!(!Role::ReadOnly.allows(Operation::Write));
    }

    #[test]
    fn test_user_can_delegates_to_role() {
        let reader = User::new("r@test.com".to_string(), "hash".to_string(), Role::ReadOnly);
        assert!(reader.can(Operation::Read));
        assert!(!reader.can(Operation::Write));
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::ReadOnly.to_string(), "read_only");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("read_only").unwrap(), Role::ReadOnly);
        assert!(Role::from_str("editor").is_err());
    }

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::ReadOnly);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("s@test.com".to_string(), "secret-hash".to_string(), Role::Admin);
        let json = serde_json::to_string(&user).expect("Failed to serialize");
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
    }
}
