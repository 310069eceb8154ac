//! User API endpoints
//!
//! Self-service endpoints for the authenticated account:
//! - GET /user - Get the account profile
//! - PUT /user - Change the account password
//! - DELETE /user - Delete the account
//!
//! Every route sits behind the authorization gate. Deleting the account
//! also invalidates its outstanding tokens: the gate's subject-existence
//! check rejects them from the next request on.

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::gate::{self, AuthGate, CurrentUser};
use crate::core::db::models::UserResponse;
use crate::core::db::repositories::{UserRepository, UserRepositoryError};

/// Password length bounds for password changes, matching registration
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 32;

/// User API state containing the user repository
#[derive(Clone)]
pub struct UserApiState {
    pub users: UserRepository,
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

/// User API error types
#[derive(Debug, thiserror::Error)]
pub enum UserApiError {
    #[error("User not found")]
    NotFound,

    #[error("Old password is incorrect")]
    OldPasswordIncorrect,

    #[error("Password must be between 6 and 32 characters")]
    InvalidPasswordLength,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for UserApiError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::NotFound => UserApiError::NotFound,
            other => UserApiError::InternalError(other.to_string()),
        }
    }
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            UserApiError::NotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            UserApiError::OldPasswordIncorrect => {
                (StatusCode::UNAUTHORIZED, "OLD_PASSWORD_INCORRECT")
            }
            UserApiError::InvalidPasswordLength => {
                (StatusCode::BAD_REQUEST, "INVALID_PASSWORD_LENGTH")
            }
            UserApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("User operation failed: {}", self);
        }

        let body = ApiError::new(self.to_string(), code);

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request for changing the account password
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

fn validate_new_password(password: &str) -> Result<(), UserApiError> {
    let length = password.chars().count();
    if length < MIN_PASSWORD_LENGTH || length > MAX_PASSWORD_LENGTH {
        return Err(UserApiError::InvalidPasswordLength);
    }
    Ok(())
}

// ============================================================================
// Router
// ============================================================================

/// Create the user API router; `gate` authorizes every route
pub fn user_router(state: UserApiState, gate: AuthGate) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/user", get(get_user_handler))
        .route("/user", put(change_password_handler))
        .route("/user", delete(delete_user_handler))
        .route_layer(middleware::from_fn_with_state(gate, gate::require_auth))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /user
/// Get the authenticated account's profile
async fn get_user_handler(
    State(state): State<Arc<UserApiState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, UserApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(UserApiError::NotFound)?;

    Ok(Json(UserResponse::from(user)))
}

/// PUT /user
/// Change the account password after verifying the old one
async fn change_password_handler(
    State(state): State<Arc<UserApiState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, UserApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(UserApiError::NotFound)?;

    let old_password_matches =
        UserRepository::verify_password(&request.old_password, &user.password_hash)?;
    if !old_password_matches {
        tracing::warn!("Password change rejected for user {}: old password incorrect", user_id);
        return Err(UserApiError::OldPasswordIncorrect);
    }

    validate_new_password(&request.new_password)?;

    state
        .users
        .update_password(user_id, &request.new_password)
        .await?;

    tracing::info!("Password changed for user {}", user_id);

    Ok(Json(MessageResponse {
        message: "You successfully changed your password.".to_string(),
    }))
}

/// DELETE /user
/// Delete the account; outstanding tokens die with it at the gate
async fn delete_user_handler(
    State(state): State<Arc<UserApiState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<MessageResponse>, UserApiError> {
    let deleted = state.users.delete(user_id).await?;
    if !deleted {
        return Err(UserApiError::NotFound);
    }

    tracing::info!("User {} deleted their account", user_id);

    Ok(Json(MessageResponse {
        message: "You successfully deleted your account.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Validation Tests
    // ========================================================================

    #[test]
    fn test_new_password_length_bounds() {
        assert!(validate_new_password("12345").is_err());
        assert!(validate_new_password("123456").is_ok());
        assert!(validate_new_password(&"a".repeat(32)).is_ok());
        assert!(validate_new_password(&"a".repeat(33)).is_err());
    }

    // ========================================================================
    // Status Mapping Tests
    // ========================================================================

    #[test]
    fn test_not_found_maps_to_404() {
        let response = UserApiError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_old_password_incorrect_maps_to_401() {
        let response = UserApiError::OldPasswordIncorrect.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_invalid_password_length_maps_to_400() {
        let response = UserApiError::InvalidPasswordLength.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_repository_error_conversion() {
        let err = UserApiError::from(UserRepositoryError::NotFound);
        assert!(matches!(err, UserApiError::NotFound));

        let err = UserApiError::from(UserRepositoryError::HashingError("cost".to_string()));
        assert!(matches!(err, UserApiError::InternalError(_)));
    }

    // ========================================================================
    // Request Deserialization Tests
    // ========================================================================

    #[test]
    fn test_change_password_request_deserialization() {
        let request: ChangePasswordRequest = serde_json::from_str(
            r#"{"old_password": "oldpass123", "new_password": "newpass456"}"#,
        )
        .unwrap();

        assert_eq!(request.old_password, "oldpass123");
        assert_eq!(request.new_password, "newpass456");
    }
}
