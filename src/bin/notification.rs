//! Notification service binary
//!
//! Consumes verification events from Kafka and sends activation emails.
//! The consumer loop runs alongside a minimal HTTP listener exposing
//! /health.

use axum::{Json, Router, routing::get};
use tower_http::trace::TraceLayer;

use tasklane::core::config::Config;
use tasklane::core::verification::{Mailer, build_consumer, run_mail_loop};

#[tokio::main]
async fn main() {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = Config::from_env().expect("Failed to load configuration");

    let mailer = Mailer::from_config(&config).expect("Failed to configure mailer");

    let consumer = build_consumer(
        &config.kafka_brokers,
        &config.kafka_group_id,
        &config.kafka_topic,
    )
    .expect("Failed to create Kafka consumer");

    tokio::spawn(run_mail_loop(consumer, mailer));

    let app = Router::new()
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.notification_port);
    tracing::info!("Notification service is running on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app.into_make_service())
        .await
        .expect("Server error");
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Notification service is running"}))
}
