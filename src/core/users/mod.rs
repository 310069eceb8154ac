//! User module for Tasklane
//!
//! Self-service account endpoints, gated by the authorization middleware.

pub mod api;

pub use api::{UserApiState, user_router};
