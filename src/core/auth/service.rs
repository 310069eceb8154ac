//! Authentication service
//!
//! Provides business logic for registration, login, logout and account
//! verification. Coordinates between the user repository, the session store,
//! the token service and the verification producer.

use std::time::Duration;

use crate::core::auth::jwt::TokenService;
use crate::core::auth::session::{SessionStore, SessionStoreError};
use crate::core::db::models::User;
use crate::core::db::repositories::{UserRepository, UserRepositoryError};
use crate::core::verification::{PublishError, VerificationProducer};

/// Minimum name length accepted at registration
const MIN_NAME_LENGTH: usize = 4;
/// Password length bounds accepted at registration
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 32;

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is not verified")]
    AccountNotVerified,

    #[error("This email is already registered")]
    EmailAlreadyExists,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Name must be at least 4 characters")]
    NameTooShort,

    #[error("Password must be between 6 and 32 characters")]
    InvalidPasswordLength,

    #[error("Password must not match name or email")]
    PasswordMatchesIdentity,

    #[error("Password confirmation does not match")]
    PasswordConfirmationMismatch,

    #[error("Verification token not found")]
    VerificationTokenNotFound,

    #[error("Failed to issue token: {0}")]
    TokenIssue(String),

    #[error("Session store error: {0}")]
    Store(#[from] SessionStoreError),

    #[error("Failed to publish verification message: {0}")]
    Publish(#[from] PublishError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

/// Registration request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    sessions: SessionStore,
    tokens: TokenService,
    verification: VerificationProducer,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: UserRepository,
        sessions: SessionStore,
        tokens: TokenService,
        verification: VerificationProducer,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
            verification,
        }
    }

    /// Validate email format
    fn validate_email(email: &str) -> Result<(), AuthError> {
        // Basic email validation
        if email.is_empty() {
            return Err(AuthError::InvalidEmail);
        }

        if !email.contains('@') || !email.contains('.') {
            return Err(AuthError::InvalidEmail);
        }

        // Check for valid structure: something@something.something
        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 {
            return Err(AuthError::InvalidEmail);
        }

        let local = parts[0];
        let domain = parts[1];

        if local.is_empty() || domain.is_empty() {
            return Err(AuthError::InvalidEmail);
        }

        if !domain.contains('.') {
            return Err(AuthError::InvalidEmail);
        }

        // Check domain has something after the dot
        let domain_parts: Vec<&str> = domain.split('.').collect();
        if domain_parts.iter().any(|p| p.is_empty()) {
            return Err(AuthError::InvalidEmail);
        }

        Ok(())
    }

    /// Validate display name
    fn validate_name(name: &str) -> Result<(), AuthError> {
        if name.chars().count() < MIN_NAME_LENGTH {
            return Err(AuthError::NameTooShort);
        }

        Ok(())
    }

    /// Validate password against the registration rules
    fn validate_password(
        password: &str,
        confirm_password: &str,
        name: &str,
        email: &str,
    ) -> Result<(), AuthError> {
        let length = password.chars().count();
        if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
            return Err(AuthError::InvalidPasswordLength);
        }

        // A password equal to the name or email is trivially guessable
        if password == name || password == email {
            return Err(AuthError::PasswordMatchesIdentity);
        }

        if password != confirm_password {
            return Err(AuthError::PasswordConfirmationMismatch);
        }

        Ok(())
    }

    /// Register a new user and publish their verification message
    ///
    /// The publish is part of the registration request: a broker failure
    /// surfaces to the caller as an error even though the account row already
    /// exists. Such an account stays unverifiable until manually remediated.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        // Validate input
        Self::validate_email(&request.email)?;
        Self::validate_name(&request.name)?;
        Self::validate_password(
            &request.password,
            &request.confirm_password,
            &request.name,
            &request.email,
        )?;

        // Create user (password will be hashed in repository)
        let user = self
            .users
            .create(&request.email, &request.name, &request.password)
            .await?;

        self.verification
            .publish(&user.email, &user.verify_token)
            .await?;

        tracing::info!("User {} created successfully", user.id);

        Ok(user)
    }

    /// Login a verified user, returning the session token and subject id
    pub async fn login(&self, request: LoginRequest) -> Result<(String, i64), AuthError> {
        Self::validate_email(&request.email)?;

        // Authenticate user
        let user = self
            .users
            .authenticate(&request.email, &request.password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.verified {
            return Err(AuthError::AccountNotVerified);
        }

        let token = self
            .tokens
            .issue(user.id)
            .map_err(|err| AuthError::TokenIssue(err.to_string()))?;

        // A token the store never saw must not authorize anything, so the
        // store write happens before the token reaches the caller
        self.sessions.record_login(&token).await?;

        tracing::info!("User {} logged in successfully", user.id);

        Ok((token, user.id))
    }

    /// Logout: revoke the session token
    ///
    /// The remaining token lifetime bounds how long a blacklist entry needs
    /// to live; an undecodable token gets the minimum.
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let remaining = match self.tokens.decode(token) {
            Ok(claims) => Duration::from_secs(claims.remaining_secs().max(0) as u64),
            Err(_) => Duration::ZERO,
        };

        self.sessions.record_logout(token, remaining).await?;

        Ok(())
    }

    /// Mark the account carrying this verification token as verified
    ///
    /// Idempotent: replaying a link that was already used succeeds again.
    pub async fn verify_account(&self, verify_token: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_verify_token(verify_token)
            .await?
            .ok_or(AuthError::VerificationTokenNotFound)?;

        self.users.mark_verified(user.id).await?;

        tracing::info!("User {} verified successfully", user.id);

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_email_valid() {
        assert!(AuthService::validate_email("user@example.com").is_ok());
        assert!(AuthService::validate_email("user.name@example.com").is_ok());
        assert!(AuthService::validate_email("user+tag@example.co.uk").is_ok());
        assert!(AuthService::validate_email("a@b.co").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(AuthService::validate_email("").is_err());
        assert!(AuthService::validate_email("invalid").is_err());
        assert!(AuthService::validate_email("@example.com").is_err());
        assert!(AuthService::validate_email("user@").is_err());
        assert!(AuthService::validate_email("user@example").is_err());
        assert!(AuthService::validate_email("user@@example.com").is_err());
        assert!(AuthService::validate_email("user@.com").is_err());
        assert!(AuthService::validate_email("user@example.").is_err());
    }

    #[test]
    fn test_validate_name_valid() {
        assert!(AuthService::validate_name("Anna").is_ok());
        assert!(AuthService::validate_name("test user").is_ok());
    }

    #[test]
    fn test_validate_name_too_short() {
        assert!(matches!(
            AuthService::validate_name(""),
            Err(AuthError::NameTooShort)
        ));
        assert!(matches!(
            AuthService::validate_name("Bob"),
            Err(AuthError::NameTooShort)
        ));
    }

    #[test]
    fn test_validate_password_valid() {
        assert!(
            AuthService::validate_password("secret1", "secret1", "test user", "u@example.com")
                .is_ok()
        );
    }

    #[test]
    fn test_validate_password_length_bounds() {
        assert!(matches!(
            AuthService::validate_password("short", "short", "test user", "u@example.com"),
            Err(AuthError::InvalidPasswordLength)
        ));

        let long = "x".repeat(33);
        assert!(matches!(
            AuthService::validate_password(&long, &long, "test user", "u@example.com"),
            Err(AuthError::InvalidPasswordLength)
        ));

        // Exactly at the bounds is accepted
        let min = "x".repeat(6);
        assert!(
            AuthService::validate_password(&min, &min, "test user", "u@example.com").is_ok()
        );
        let max = "x".repeat(32);
        assert!(
            AuthService::validate_password(&max, &max, "test user", "u@example.com").is_ok()
        );
    }

    #[test]
    fn test_validate_password_must_differ_from_identity() {
        assert!(matches!(
            AuthService::validate_password("test user", "test user", "test user", "u@example.com"),
            Err(AuthError::PasswordMatchesIdentity)
        ));
        assert!(matches!(
            AuthService::validate_password(
                "u@example.com",
                "u@example.com",
                "test user",
                "u@example.com"
            ),
            Err(AuthError::PasswordMatchesIdentity)
        ));
    }

    #[test]
    fn test_validate_password_confirmation_mismatch() {
        assert!(matches!(
            AuthService::validate_password("secret1", "secret2", "test user", "u@example.com"),
            Err(AuthError::PasswordConfirmationMismatch)
        ));
    }

    // ========================================================================
    // Error Conversion Tests
    // ========================================================================

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            format!("{}", AuthError::InvalidCredentials),
            "Invalid credentials"
        );
        assert_eq!(
            format!("{}", AuthError::AccountNotVerified),
            "Account is not verified"
        );
        assert_eq!(
            format!("{}", AuthError::EmailAlreadyExists),
            "This email is already registered"
        );
        assert_eq!(
            format!("{}", AuthError::VerificationTokenNotFound),
            "Verification token not found"
        );
    }

    #[test]
    fn test_auth_error_from_user_repository_error() {
        let err: AuthError = UserRepositoryError::EmailAlreadyExists.into();
        assert!(matches!(err, AuthError::EmailAlreadyExists));

        let err: AuthError = UserRepositoryError::NotFound.into();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn test_auth_error_from_session_store_error() {
        let err: AuthError = SessionStoreError::Unavailable("timed out".to_string()).into();
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[test]
    fn test_auth_error_from_publish_error() {
        let err: AuthError = PublishError::Delivery("broker down".to_string()).into();
        assert!(matches!(err, AuthError::Publish(_)));
    }

    // ========================================================================
    // Request Deserialization Tests
    // ========================================================================

    #[test]
    fn test_register_request_deserialization() {
        let json = r#"{
            "email": "user@example.com",
            "name": "test user",
            "password": "secret1",
            "confirm_password": "secret1"
        }"#;

        let request: RegisterRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.email, "user@example.com");
        assert_eq!(request.name, "test user");
        assert_eq!(request.password, "secret1");
        assert_eq!(request.confirm_password, "secret1");
    }

    #[test]
    fn test_login_request_deserialization() {
        let json = r#"{
            "email": "user@example.com",
            "password": "secret1"
        }"#;

        let request: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.email, "user@example.com");
        assert_eq!(request.password, "secret1");
    }
}
