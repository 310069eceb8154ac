//! Auth service binary
//!
//! Owns the account store's auth surface: registration, login, logout,
//! email verification, and the /authorize endpoint other services call.

use std::time::Duration;

use axum::{Json, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use tasklane::core::auth::{
    AuthApiState, AuthGate, AuthService, SessionStore, TokenConfig, TokenService, auth_router,
};
use tasklane::core::config::Config;
use tasklane::core::db::{DbConfig, create_pool_with_migrations};
use tasklane::core::db::repositories::UserRepository;
use tasklane::core::verification::VerificationProducer;

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

    let users = UserRepository::new(pool);

    let tokens = TokenService::new(
        TokenConfig::new(config.jwt_secret.as_str()).ttl_secs(config.token_ttl_secs as i64),
    );

    let sessions = SessionStore::connect(
        &config.redis_url,
        config.session_policy,
        Duration::from_secs(config.token_ttl_secs),
        Duration::from_secs(config.store_timeout_secs),
    )
    .await
    .expect("Failed to connect to Redis");

    let verification = VerificationProducer::new(&config.kafka_brokers, &config.kafka_topic)
        .expect("Failed to create Kafka producer");

    let auth_service = AuthService::new(
        users.clone(),
        sessions.clone(),
        tokens.clone(),
        verification,
    );
    let gate = AuthGate::local(tokens, sessions, users);

    let app = auth_router(AuthApiState { auth_service, gate })
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.auth_port);
    tracing::info!("Auth service is running on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Auth service is running"}))
}
