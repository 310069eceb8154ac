//! Api service binary
//!
//! Serves the todo and user routes. Every protected route is authorized
//! through the auth service's /authorize endpoint; this process never
//! touches the signing secret or the session store.

use std::time::Duration;

use axum::{Json, Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tasklane::core::auth::AuthGate;
use tasklane::core::config::Config;
use tasklane::core::db::{DbConfig, create_pool_with_migrations};
use tasklane::core::db::repositories::{TodoRepository, UserRepository};
use tasklane::core::todos::{TodoApiState, todo_router};
use tasklane::core::users::{UserApiState, user_router};

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("Failed to load configuration");

    let pool = create_pool_with_migrations(&DbConfig::new(config.database_url.as_str()))
        .await
        .expect("Failed to connect to database");

    let todos = TodoRepository::new(pool.clone());
    let users = UserRepository::new(pool);

    let gate = AuthGate::remote(
        config.authorize_url.as_str(),
        Duration::from_secs(config.authorize_timeout_secs),
    )
    .expect("Failed to build authorizer client");

    let app = Router::new()
        .merge(todo_router(TodoApiState { todos }, gate.clone()))
        .merge(user_router(UserApiState { users }, gate))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.api_port);
    tracing::info!("Api service is running on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Api service is running"}))
}
