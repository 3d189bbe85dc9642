//! Authentication API endpoint
//!
//! POST /token - exchange credentials for a bearer token (OAuth2 password
//! grant style form fields).

use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState};
use crate::services::user::LoginInput;

/// Form body for the token endpoint (password grant fields)
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// Response for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// POST /token - issue a bearer token
///
/// The username field carries the user's email. Both an unknown email and a
/// wrong password produce the same 401.
pub async fn issue_token(
    State(state): State<AppState>,
    Form(body): Form<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let input = LoginInput::new(body.username, body.password);

    let token = state.user_service.login(input).await?;

    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}
