//! Authorization gate for protected routes
//!
//! Every protected route sits behind the same four-step check:
//!
//! 1. Extract the bearer token from the `Authorization` header
//! 2. Verify the token signature and expiry
//! 3. Check the session store says the token is still live
//! 4. Check the subject account still exists
//!
//! The gate runs either locally (the service holds the signing secret, the
//! session store connection and the user table) or remotely (the service
//! forwards the credential to the auth service's `/authorize` endpoint and
//! trusts its verdict). Callers see a single uniform 401 for every failure
//! so the response never reveals which step rejected the credential.

use std::time::Duration;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::core::auth::jwt::TokenService;
use crate::core::auth::session::{SessionStore, SessionStoreError};
use crate::core::db::repositories::{UserRepository, UserRepositoryError};

// ============================================================================
// Errors
// ============================================================================

/// Gate error types
///
/// All variants map to 401 externally. `StoreUnavailable` and `UserLookup`
/// are operational faults that fail closed; they are logged at error level
/// so operators can tell them apart from ordinary rejections.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Malformed authorization header")]
    MalformedCredential,

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(#[from] SessionStoreError),

    #[error("User lookup failed: {0}")]
    UserLookup(#[from] UserRepositoryError),
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

/// Convert GateError to API response
///
/// Uniform 401: the body never distinguishes a bad signature from an expired
/// token, a revoked session, a deleted account or a store outage.
impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match &self {
            GateError::StoreUnavailable(err) => {
                tracing::error!("Session store unavailable, refusing request: {}", err);
            }
            GateError::UserLookup(err) => {
                tracing::error!("User lookup failed during authorization: {}", err);
            }
            GateError::Unauthenticated | GateError::MalformedCredential => {}
        }

        let body = Json(ApiError::new("Unauthorized", "UNAUTHORIZED"));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

// ============================================================================
// Authorization Types
// ============================================================================

/// Body returned by the `/authorize` endpoint on success
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    pub subject_id: i64,
}

/// Authenticated subject id, attached to the request once the gate passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

/// Extract the bearer token from the `Authorization` header
///
/// A missing header is `Unauthenticated`; a present header with the wrong
/// scheme or an empty token is `MalformedCredential`. Both surface as 401.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, GateError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(GateError::Unauthenticated)?;

    let value = value.to_str().map_err(|_| GateError::MalformedCredential)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(GateError::MalformedCredential)?;

    if token.is_empty() {
        return Err(GateError::MalformedCredential);
    }

    Ok(token)
}

// ============================================================================
// Local Gate
// ============================================================================

/// Gate backend for the service that owns the signing secret, the session
/// store and the user table
#[derive(Clone)]
pub struct LocalGate {
    tokens: TokenService,
    sessions: SessionStore,
    users: UserRepository,
}

impl LocalGate {
    /// Create a local gate from its three dependencies
    pub fn new(tokens: TokenService, sessions: SessionStore, users: UserRepository) -> Self {
        Self {
            tokens,
            sessions,
            users,
        }
    }

    /// Run the full authorization check against local state
    pub async fn authorize(&self, token: &str) -> Result<i64, GateError> {
        let subject = self.tokens.verify(token).map_err(|err| {
            tracing::debug!("Token verification failed: {}", err);
            GateError::Unauthenticated
        })?;

        // Store check fails closed: an unreachable store rejects the request
        if !self.sessions.is_live(token).await? {
            tracing::debug!("Token is not live in session store");
            return Err(GateError::Unauthenticated);
        }

        // A valid token for a deleted account is worthless
        if !self.users.exists(subject).await? {
            tracing::debug!("Subject {} no longer exists", subject);
            return Err(GateError::Unauthenticated);
        }

        Ok(subject)
    }
}

// ============================================================================
// Remote Gate
// ============================================================================

/// Gate backend that forwards the credential to the auth service
///
/// One attempt with a bounded timeout, no retry and no caching of verdicts:
/// an ambiguous failure rejects the request rather than looping against the
/// authoritative source, and revocation latency stays bounded to the next
/// request instead of a cache TTL.
#[derive(Clone)]
pub struct RemoteGate {
    client: reqwest::Client,
    authorize_url: String,
}

impl RemoteGate {
    /// Create a remote gate targeting the given `/authorize` endpoint
    pub fn new(
        authorize_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            authorize_url: authorize_url.into(),
        })
    }

    /// Forward the token and map every failure mode to `Unauthenticated`
    pub async fn authorize(&self, token: &str) -> Result<i64, GateError> {
        let response = self
            .client
            .post(&self.authorize_url)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await
            .map_err(|err| {
                tracing::warn!("Authorize call to {} failed: {}", self.authorize_url, err);
                GateError::Unauthenticated
            })?;

        if !response.status().is_success() {
            return Err(GateError::Unauthenticated);
        }

        let body: AuthorizeResponse = response.json().await.map_err(|err| {
            tracing::warn!("Failed to parse authorize response: {}", err);
            GateError::Unauthenticated
        })?;

        Ok(body.subject_id)
    }
}

// ============================================================================
// Gate Facade
// ============================================================================

#[derive(Clone)]
enum GateBackend {
    Local(LocalGate),
    Remote(RemoteGate),
}

/// Authorization gate placed in front of protected route groups
#[derive(Clone)]
pub struct AuthGate {
    backend: GateBackend,
}

impl AuthGate {
    /// Gate that checks tokens against local state
    pub fn local(tokens: TokenService, sessions: SessionStore, users: UserRepository) -> Self {
        Self {
            backend: GateBackend::Local(LocalGate::new(tokens, sessions, users)),
        }
    }

    /// Gate that delegates to the auth service over HTTP
    pub fn remote(
        authorize_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            backend: GateBackend::Remote(RemoteGate::new(authorize_url, timeout)?),
        })
    }

    /// Authorize an already-extracted token
    pub async fn authorize_token(&self, token: &str) -> Result<i64, GateError> {
        match &self.backend {
            GateBackend::Local(gate) => gate.authorize(token).await,
            GateBackend::Remote(gate) => gate.authorize(token).await,
        }
    }

    /// Extract the bearer token from request headers and authorize it
    pub async fn authorize_request(&self, headers: &HeaderMap) -> Result<i64, GateError> {
        let token = extract_bearer(headers)?;
        self.authorize_token(token).await
    }
}

/// Middleware that rejects unauthenticated requests before they reach the
/// handler and attaches [`CurrentUser`] to the request extensions
pub async fn require_auth(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let subject = gate.authorize_request(request.headers()).await?;

    request.extensions_mut().insert(CurrentUser(subject));

    Ok(next.run(request).await)
}
