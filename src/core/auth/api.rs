//! Auth API endpoints
//!
//! Provides the auth service's REST surface:
//! - POST /register - Create an account and queue its verification email
//! - POST /login - Issue a session token
//! - POST /logout - Revoke the presented token (protected)
//! - POST /authorize - Full authorization check for other services
//! - GET /verify - Email verification callback

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::gate::{self, AuthGate, AuthorizeResponse, GateError};
use crate::core::auth::service::{AuthError, AuthService, LoginRequest, RegisterRequest};
use crate::core::db::models::UserResponse;

/// Auth API state containing the auth service and the gate protecting logout
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
    pub gate: AuthGate,
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

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            // Deliberately shares the credentials code: the response must not
            // reveal whether the email, the password or the verification
            // state rejected the login
            AuthError::AccountNotVerified => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::EmailAlreadyExists => (StatusCode::CONFLICT, "EMAIL_EXISTS"),
            AuthError::InvalidEmail => (StatusCode::BAD_REQUEST, "INVALID_EMAIL"),
            AuthError::NameTooShort => (StatusCode::BAD_REQUEST, "NAME_TOO_SHORT"),
            AuthError::InvalidPasswordLength => {
                (StatusCode::BAD_REQUEST, "INVALID_PASSWORD_LENGTH")
            }
            AuthError::PasswordMatchesIdentity => {
                (StatusCode::BAD_REQUEST, "PASSWORD_MATCHES_IDENTITY")
            }
            AuthError::PasswordConfirmationMismatch => {
                (StatusCode::BAD_REQUEST, "PASSWORD_MISMATCH")
            }
            AuthError::VerificationTokenNotFound => {
                (StatusCode::NOT_FOUND, "VERIFICATION_TOKEN_NOT_FOUND")
            }
            AuthError::TokenIssue(_) => (StatusCode::INTERNAL_SERVER_ERROR, "TOKEN_ISSUE_FAILED"),
            AuthError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_STORE_ERROR"),
            AuthError::Publish(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "VERIFICATION_PUBLISH_FAILED")
            }
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match &self {
            AuthError::AccountNotVerified => {
                tracing::warn!("Login rejected: account is not verified");
                AuthError::InvalidCredentials.to_string()
            }
            _ => self.to_string(),
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Auth operation failed: {}", self);
        }

        let body = ApiError::new(message, code);

        (status, Json(body)).into_response()
    }
}

/// Successful login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub subject_id: i64,
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Query parameters for GET /verify
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Create the auth API router
pub fn auth_router(state: AuthApiState) -> Router {
    let protected = Router::new()
        .route("/logout", post(logout_handler))
        .route_layer(middleware::from_fn_with_state(
            state.gate.clone(),
            gate::require_auth,
        ));

    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/authorize", post(authorize_handler))
        .route("/verify", get(verify_handler))
        .merge(protected)
        .with_state(Arc::new(state))
}

/// POST /register
/// Create an account; the verification email goes out through the pipeline
async fn register_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    tracing::info!("Registration attempt for email: {}", request.email);

    let user = state.auth_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// POST /login
/// Authenticate and issue a session token
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AuthError> {
    tracing::info!("Login attempt for email: {}", request.email);

    let (token, subject_id) = state.auth_service.login(request).await?;

    Ok(Json(LoginResponse { token, subject_id }))
}

/// POST /logout
/// Revoke the presented token; the gate already authorized it
async fn logout_handler(State(state): State<Arc<AuthApiState>>, headers: HeaderMap) -> Response {
    let token = match gate::extract_bearer(&headers) {
        Ok(token) => token,
        Err(err) => return err.into_response(),
    };

    match state.auth_service.logout(token).await {
        Ok(()) => Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

/// POST /authorize
/// Service-to-service endpoint running the full authorization check
async fn authorize_handler(
    State(state): State<Arc<AuthApiState>>,
    headers: HeaderMap,
) -> Result<Json<AuthorizeResponse>, GateError> {
    let subject_id = state.gate.authorize_request(&headers).await?;

    Ok(Json(AuthorizeResponse { subject_id }))
}

/// GET /verify?token=...
/// Email verification callback; replaying a used link succeeds again
async fn verify_handler(
    State(state): State<Arc<AuthApiState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let token = match query.token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => {
            let body = ApiError::new("Verify token is missing", "VERIFY_TOKEN_MISSING");
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    match state.auth_service.verify_account(token).await {
        Ok(_) => Json(MessageResponse {
            message: "Account verified successfully".to_string(),
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Status Mapping Tests
    // ========================================================================

    #[test]
    fn test_invalid_credentials_maps_to_401() {
        let response = AuthError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unverified_account_maps_to_401() {
        let response = AuthError::AccountNotVerified.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_duplicate_email_maps_to_409() {
        let response = AuthError::EmailAlreadyExists.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_errors_map_to_400() {
        for err in [
            AuthError::InvalidEmail,
            AuthError::NameTooShort,
            AuthError::InvalidPasswordLength,
            AuthError::PasswordMatchesIdentity,
            AuthError::PasswordConfirmationMismatch,
        ] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_unknown_verification_token_maps_to_404() {
        let response = AuthError::VerificationTokenNotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_publish_failure_maps_to_500() {
        use crate::core::verification::PublishError;

        let err = AuthError::Publish(PublishError::Delivery("broker down".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_unverified_account_body_is_generic() {
        use axum::body::to_bytes;

        let response = AuthError::AccountNotVerified.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"], "Invalid credentials");
        assert_eq!(body["code"], "INVALID_CREDENTIALS");
    }

    // ========================================================================
    // Response Serialization Tests
    // ========================================================================

    #[test]
    fn test_login_response_serialization() {
        let response = LoginResponse {
            token: "abc.def.ghi".to_string(),
            subject_id: 42,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "abc.def.ghi");
        assert_eq!(json["subject_id"], 42);
    }

    #[test]
    fn test_verify_query_token_optional() {
        let query: VerifyQuery = serde_json::from_str("{}").unwrap();
        assert!(query.token.is_none());

        let query: VerifyQuery = serde_json::from_str(r#"{"token": "abc"}"#).unwrap();
        assert_eq!(query.token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_api_error_serialization() {
        let err = ApiError::new("Something failed", "SOMETHING_FAILED");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["error"], "Something failed");
        assert_eq!(json["code"], "SOMETHING_FAILED");
    }
}
