//! Todo API endpoints
//!
//! Provides REST API endpoints for todo management:
//! - POST /todo - Create a new todo
//! - GET /todo/:id - Get todo by ID
//! - PUT /todo/:id - Update todo
//! - DELETE /todo/:id - Delete todo
//!
//! Every route sits behind the authorization gate; handlers read the
//! authenticated subject from the request extensions and enforce ownership
//! before touching a todo.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::gate::{self, AuthGate, CurrentUser};
use crate::core::db::models::{TodoResponse, TodoStatus};
use crate::core::db::repositories::{TodoRepository, TodoRepositoryError};

/// Minimum length for a todo description
const MIN_DESCRIPTION_LENGTH: usize = 6;

/// Todo API state containing the todo repository
#[derive(Clone)]
pub struct TodoApiState {
    pub todos: TodoRepository,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Todo API error types
#[derive(Debug, thiserror::Error)]
pub enum TodoApiError {
    #[error("Todo not found")]
    NotFound,

    #[error("You do not have permission to access this todo")]
    AccessDenied,

    #[error("Description must be at least 6 characters")]
    DescriptionTooShort,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<TodoRepositoryError> for TodoApiError {
    fn from(err: TodoRepositoryError) -> Self {
        match err {
            TodoRepositoryError::NotFound => TodoApiError::NotFound,
            TodoRepositoryError::DatabaseError(e) => TodoApiError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for TodoApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            TodoApiError::NotFound => (StatusCode::NOT_FOUND, "TODO_NOT_FOUND"),
            TodoApiError::AccessDenied => (StatusCode::FORBIDDEN, "ACCESS_DENIED"),
            TodoApiError::DescriptionTooShort => {
                (StatusCode::BAD_REQUEST, "DESCRIPTION_TOO_SHORT")
            }
            TodoApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Todo operation failed: {}", self);
        }

        let body = ApiError::new(self.to_string(), code);

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request for creating a new todo
#[derive(Debug, Deserialize)]
pub struct TodoRequest {
    pub description: String,
}

/// Request for updating a todo; replaces description and status
#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub description: String,
    pub status: TodoStatus,
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn validate_description(description: &str) -> Result<(), TodoApiError> {
    if description.chars().count() < MIN_DESCRIPTION_LENGTH {
        return Err(TodoApiError::DescriptionTooShort);
    }
    Ok(())
}

// ============================================================================
// Router
// ============================================================================

/// Create the todo API router; `gate` authorizes every route
pub fn todo_router(state: TodoApiState, gate: AuthGate) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/todo", post(create_todo_handler))
        .route("/todo/{id}", get(read_todo_handler))
        .route("/todo/{id}", put(update_todo_handler))
        .route("/todo/{id}", delete(delete_todo_handler))
        .route_layer(middleware::from_fn_with_state(gate, gate::require_auth))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /todo
/// Create a new todo owned by the authenticated subject
async fn create_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<TodoRequest>,
) -> Result<Json<TodoResponse>, TodoApiError> {
    validate_description(&request.description)?;

    let todo = state.todos.create(user_id, &request.description).await?;

    tracing::info!("Todo {} created for user {}", todo.id, user_id);

    Ok(Json(TodoResponse::from(todo)))
}

/// GET /todo/:id
/// Get a todo by ID; only the owner may read it
async fn read_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<TodoResponse>, TodoApiError> {
    let todo = state
        .todos
        .find_by_id(id)
        .await?
        .ok_or(TodoApiError::NotFound)?;

    if todo.user_id != user_id {
        return Err(TodoApiError::AccessDenied);
    }

    Ok(Json(TodoResponse::from(todo)))
}

/// PUT /todo/:id
/// Replace a todo's description and status; only the owner may update it
async fn update_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, TodoApiError> {
    let todo = state
        .todos
        .find_by_id(id)
        .await?
        .ok_or(TodoApiError::NotFound)?;

    if todo.user_id != user_id {
        return Err(TodoApiError::AccessDenied);
    }

    validate_description(&request.description)?;

    let updated = state
        .todos
        .update(id, &request.description, request.status)
        .await?;

    tracing::info!("Todo {} updated by user {}", id, user_id);

    Ok(Json(TodoResponse::from(updated)))
}

/// DELETE /todo/:id
/// Delete a todo; only the owner may delete it
async fn delete_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, TodoApiError> {
    let todo = state
        .todos
        .find_by_id(id)
        .await?
        .ok_or(TodoApiError::NotFound)?;

    if todo.user_id != user_id {
        return Err(TodoApiError::AccessDenied);
    }

    state.todos.delete(id).await?;

    tracing::info!("Todo {} deleted by user {}", id, user_id);

    Ok(Json(MessageResponse {
        message: "Todo deleted successfully".to_string(),
    }))
}
