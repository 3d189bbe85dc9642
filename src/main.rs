//! Taskboard - a minimal task tracking service

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskboard::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxTaskRepository, SqlxUserRepository},
    },
    services::{notify::LogNotifier, task::TaskService, token::TokenCodec, user::UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskboard=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting taskboard...");

    // Load configuration (DATABASE_URL and TASKBOARD_* override the file)
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let task_repo = SqlxTaskRepository::boxed(pool.clone());

    // The signing key is loaded once at startup and injected into the codec.
    let token_codec = TokenCodec::new(&config.auth.secret_key);

    // Initialize services
    let user_service = Arc::new(UserService::new(user_repo, token_codec));
    let task_service = Arc::new(TaskService::new(task_repo, Arc::new(LogNotifier)));

    // Build application state
    let state = AppState {
        user_service,
        task_service,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
