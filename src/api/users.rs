//! User API endpoint
//!
//! POST /users/ - user registration. No guard: registration is open, and the
//! role is fixed at creation.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::models::{Role, User};
use crate::services::user::RegisterInput;

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

/// Response for user info (never includes the password hash)
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// POST /users/ - register a new user
pub async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let input = RegisterInput::new(body.email, body.password, body.role);

    let user = state.user_service.register(input).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}
