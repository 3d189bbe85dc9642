//! API layer - HTTP handlers and routing
//!
//! Route map:
//! - POST /token - credentials to bearer token (no guard)
//! - POST /users/ - registration (no guard)
//! - GET /tasks/, GET /tasks/{id} - authenticated
//! - POST /tasks/, PUT /tasks/{id}, DELETE /tasks/{id} - authenticated +
//!   write role
//!
//! Every protected route authenticates before it authorizes; an
//! unauthenticated request is rejected before the role is even consulted.

pub mod auth;
pub mod middleware;
pub mod tasks;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Write routes (need authentication and a write-capable role)
    let write_routes = Router::new()
        .route("/tasks/", post(tasks::create_task))
        .route("/tasks/{id}", put(tasks::update_task))
        .route("/tasks/{id}", delete(tasks::delete_task))
        .route_layer(axum_middleware::from_fn(middleware::require_write))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Read routes (need authentication only)
    let read_routes = Router::new()
        .route("/tasks/", get(tasks::list_tasks))
        .route("/tasks/{id}", get(tasks::get_task))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/token", post(auth::issue_token))
        .route("/users/", post(users::create_user))
        .merge(read_routes)
        .merge(write_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .merge(build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxTaskRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::services::notify::LogNotifier;
    use crate::services::task::TaskService;
    use crate::services::token::{TokenCodec, TOKEN_TTL_MINUTES};
    use crate::services::user::UserService;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::sync::Arc;

    const TEST_SECRET: &str = "e2e-test-secret";

    async fn test_server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let task_repo = SqlxTaskRepository::boxed(pool.clone());

        let state = AppState {
            user_service: Arc::new(UserService::new(user_repo, TokenCodec::new(TEST_SECRET))),
            task_service: Arc::new(TaskService::new(task_repo, Arc::new(LogNotifier))),
        };

        let app = build_router(state, "http://localhost:3000");
        TestServer::new(app).expect("Failed to start test server")
    }

    async fn register(server: &TestServer, email: &str, password: &str, role: &str) {
        let response = server
            .post("/users/")
            .json(&json!({ "email": email, "password": password, "role": role }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    async fn login(server: &TestServer, email: &str, password: &str) -> String {
        let response = server
            .post("/token")
            .form(&json!({ "username": email, "password": password }))
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().expect("missing token").to_string()
    }

    fn task_body(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "description": "a task",
            "reporter": "admin@example.com",
        })
    }

    // ========================================================================
    // Registration and login
    // ========================================================================

    #[tokio::test]
    async fn test_register_returns_user_without_hash() {
        let server = test_server().await;

        let response = server
            .post("/users/")
            .json(&json!({
                "email": "new@example.com",
                "password": "password123",
                "role": "read_only",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: serde_json::Value = response.json();
        assert_eq!(body["email"], "new@example.com");
        assert_eq!(body["role"], "read_only");
        assert!(body.get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let server = test_server().await;
        register(&server, "dup@example.com", "password123", "read_only").await;

        let response = server
            .post("/users/")
            .json(&json!({
                "email": "dup@example.com",
                "password": "other",
                "role": "admin",
            }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_bad_credentials_are_indistinguishable() {
        let server = test_server().await;
        register(&server, "alice@example.com", "password123", "read_only").await;

        let wrong_password = server
            .post("/token")
            .form(&json!({ "username": "alice@example.com", "password": "nope" }))
            .await;
        let unknown_email = server
            .post("/token")
            .form(&json!({ "username": "ghost@example.com", "password": "password123" }))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);

        let body1: serde_json::Value = wrong_password.json();
        let body2: serde_json::Value = unknown_email.json();
        assert_eq!(body1, body2, "failure responses must be identical");
    }

    // ========================================================================
    // Role enforcement
    // ========================================================================

    #[tokio::test]
    async fn test_read_only_user_can_read_but_not_write() {
        let server = test_server().await;
        register(&server, "admin@example.com", "adminpass", "admin").await;
        register(&server, "alice@example.com", "password123", "read_only").await;

        let admin_token = login(&server, "admin@example.com", "adminpass").await;
        let alice_token = login(&server, "alice@example.com", "password123").await;

        // Admin seeds a task.
        let created = server
            .post("/tasks/")
            .authorization_bearer(&admin_token)
            .json(&task_body("seeded"))
            .await;
        created.assert_status(StatusCode::CREATED);
        let task: serde_json::Value = created.json();
        let task_id = task["id"].as_i64().unwrap();

        // Write is forbidden for the read-only role.
        let forbidden = server
            .post("/tasks/")
            .authorization_bearer(&alice_token)
            .json(&task_body("not allowed"))
            .await;
        forbidden.assert_status(StatusCode::FORBIDDEN);

        let forbidden = server
            .delete(&format!("/tasks/{}", task_id))
            .authorization_bearer(&alice_token)
            .await;
        forbidden.assert_status(StatusCode::FORBIDDEN);

        // Reads succeed.
        let list = server
            .get("/tasks/")
            .authorization_bearer(&alice_token)
            .await;
        list.assert_status_ok();
        let tasks: Vec<serde_json::Value> = list.json();
        assert_eq!(tasks.len(), 1);

        let one = server
            .get(&format!("/tasks/{}", task_id))
            .authorization_bearer(&alice_token)
            .await;
        one.assert_status_ok();
    }

    #[tokio::test]
    async fn test_admin_full_crud() {
        let server = test_server().await;
        register(&server, "admin@example.com", "adminpass", "admin").await;
        let token = login(&server, "admin@example.com", "adminpass").await;

        let created = server
            .post("/tasks/")
            .authorization_bearer(&token)
            .json(&task_body("lifecycle"))
            .await;
        created.assert_status(StatusCode::CREATED);
        let task: serde_json::Value = created.json();
        let task_id = task["id"].as_i64().unwrap();
        assert_eq!(task["status"], "todo");

        let updated = server
            .put(&format!("/tasks/{}", task_id))
            .authorization_bearer(&token)
            .json(&json!({
                "title": "lifecycle",
                "description": "a task",
                "reporter": "admin@example.com",
                "status": "in progress",
                "priority": "high",
            }))
            .await;
        updated.assert_status_ok();
        let updated: serde_json::Value = updated.json();
        assert_eq!(updated["status"], "in progress");
        assert_eq!(updated["priority"], "high");

        let deleted = server
            .delete(&format!("/tasks/{}", task_id))
            .authorization_bearer(&token)
            .await;
        deleted.assert_status_ok();
        let deleted: serde_json::Value = deleted.json();
        assert_eq!(deleted["id"], task_id);

        let gone = server
            .get(&format!("/tasks/{}", task_id))
            .authorization_bearer(&token)
            .await;
        gone.assert_status(StatusCode::NOT_FOUND);
    }

    // ========================================================================
    // Token handling
    // ========================================================================

    #[tokio::test]
    async fn test_missing_token_rejected_before_role_check() {
        let server = test_server().await;

        let read = server.get("/tasks/").await;
        read.assert_status(StatusCode::UNAUTHORIZED);

        let write = server.post("/tasks/").json(&task_body("no auth")).await;
        write.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let server = test_server().await;

        let response = server
            .get("/tasks/")
            .authorization_bearer("not.a.token")
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_rejected_on_any_operation() {
        let server = test_server().await;
        register(&server, "admin@example.com", "adminpass", "admin").await;

        // Valid signature, elapsed window.
        let codec = TokenCodec::new(TEST_SECRET);
        let past = Utc::now() - Duration::minutes(TOKEN_TTL_MINUTES + 1);
        let stale = codec.issue("admin@example.com", past).expect("issue failed");

        let read = server.get("/tasks/").authorization_bearer(&stale).await;
        read.assert_status(StatusCode::UNAUTHORIZED);

        let write = server
            .post("/tasks/")
            .authorization_bearer(&stale)
            .json(&task_body("too late"))
            .await;
        write.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_foreign_key_token_rejected() {
        let server = test_server().await;
        register(&server, "admin@example.com", "adminpass", "admin").await;

        let foreign = TokenCodec::new("attacker-secret");
        let token = foreign
            .issue("admin@example.com", Utc::now())
            .expect("issue failed");

        let response = server.get("/tasks/").authorization_bearer(&token).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    // ========================================================================
    // Task routes
    // ========================================================================

    #[tokio::test]
    async fn test_task_not_found() {
        let server = test_server().await;
        register(&server, "admin@example.com", "adminpass", "admin").await;
        let token = login(&server, "admin@example.com", "adminpass").await;

        let get = server.get("/tasks/999").authorization_bearer(&token).await;
        get.assert_status(StatusCode::NOT_FOUND);

        let delete = server
            .delete("/tasks/999")
            .authorization_bearer(&token)
            .await;
        delete.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_list_tasks_respects_skip_and_limit() {
        let server = test_server().await;
        register(&server, "admin@example.com", "adminpass", "admin").await;
        let token = login(&server, "admin@example.com", "adminpass").await;

        for i in 0..4 {
            server
                .post("/tasks/")
                .authorization_bearer(&token)
                .json(&task_body(&format!("task {}", i)))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let page = server
            .get("/tasks/")
            .add_query_param("skip", 1)
            .add_query_param("limit", 2)
            .authorization_bearer(&token)
            .await;
        page.assert_status_ok();
        let tasks: Vec<serde_json::Value> = page.json();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0]["title"], "task 1");
    }

    #[tokio::test]
    async fn test_create_task_empty_title_rejected() {
        let server = test_server().await;
        register(&server, "admin@example.com", "adminpass", "admin").await;
        let token = login(&server, "admin@example.com", "adminpass").await;

        let response = server
            .post("/tasks/")
            .authorization_bearer(&token)
            .json(&json!({
                "title": "",
                "description": "a task",
                "reporter": "admin@example.com",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
