//! User service
//!
//! Business logic for user accounts and authentication:
//! - Registration with duplicate-email rejection
//! - Login: credential check plus bearer token issuance
//! - Token authentication: resolve an inbound token back to a user
//!
//! Login deliberately returns the same error for an unknown email and for a
//! wrong password, so callers cannot enumerate registered accounts.

use crate::db::repositories::UserRepository;
use crate::models::{Role, User};
use crate::services::password::{hash_password, verify_password};
use crate::services::token::{TokenCodec, TokenError};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Bad email/password pair at login; never reveals which part was wrong
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, malformed, unsigned, or expired token, or a token whose
    /// subject no longer resolves to a user
    #[error("Authentication required")]
    Unauthenticated,

    /// Valid identity but the account may not access the system
    #[error("Inactive user")]
    InactiveUser,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for registration and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    token_codec: TokenCodec,
}

impl UserService {
    /// Create a new user service with the given repository and token codec
    pub fn new(user_repo: Arc<dyn UserRepository>, token_codec: TokenCodec) -> Self {
        Self {
            user_repo,
            token_codec,
        }
    }

    /// Register a new user
    ///
    /// # Errors
    ///
    /// - `ValidationError` if email or password is empty or the email is
    ///   malformed
    /// - `UserExists` if the email is already registered
    /// - `InternalError` for database errors
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;

        let user = User::new(input.email, password_hash, input.role.unwrap_or_default());

        let created_user = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(
            "Registered user {} with role {}",
            created_user.email,
            created_user.role
        );

        Ok(created_user)
    }

    /// Login with credentials, returning a bearer token on success.
    ///
    /// An unknown email and a wrong password both fail with
    /// `InvalidCredentials`; the two cases are indistinguishable to the
    /// caller. A malformed stored digest also fails that way rather than
    /// surfacing an internal error.
    pub async fn login(&self, input: LoginInput) -> Result<String, UserServiceError> {
        let user = self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !verify_password(&input.password, &user.password_hash) {
            return Err(UserServiceError::InvalidCredentials);
        }

        let token = self
            .token_codec
            .issue(&user.email, Utc::now())
            .context("Failed to issue token")?;

        tracing::debug!("Issued token for {}", user.email);

        Ok(token)
    }

    /// Resolve an inbound bearer token to a user.
    ///
    /// Fails with `Unauthenticated` when the token is invalid or expired, or
    /// when its subject no longer resolves to a user. An inactive account is
    /// rejected after authentication.
    pub async fn authenticate_token(&self, token: &str) -> Result<User, UserServiceError> {
        let subject = self
            .token_codec
            .verify(token, Utc::now())
            .map_err(|e| match e {
                TokenError::Invalid | TokenError::Expired => UserServiceError::Unauthenticated,
            })?;

        let user = self
            .user_repo
            .get_by_email(&subject)
            .await
            .context("Failed to resolve token subject")?
            .ok_or(UserServiceError::Unauthenticated)?;

        if !user.is_active {
            return Err(UserServiceError::InactiveUser);
        }

        Ok(user)
    }

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.email.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Email cannot be empty".to_string(),
            ));
        }

        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }

        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        Ok(())
    }
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

impl RegisterInput {
    /// Create a new registration input
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        role: Option<Role>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role,
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    /// Create a new login input
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}
