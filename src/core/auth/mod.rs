//! Authentication module for Tasklane
//!
//! This module provides authentication functionality including:
//! - Session token generation and validation
//! - User registration and login
//! - Session state tracking in Redis
//! - The authorization gate protecting other services
//! - REST API endpoints for auth operations

pub mod api;
pub mod gate;
pub mod jwt;
pub mod service;
pub mod session;

pub use api::{AuthApiState, auth_router};
pub use gate::{AuthGate, AuthorizeResponse, CurrentUser, GateError, require_auth};
pub use jwt::{Claims, TokenConfig, TokenError, TokenService};
pub use service::{AuthError, AuthService, LoginRequest, RegisterRequest};
pub use session::{SessionPolicy, SessionStore, SessionStoreError};
