//! Todo module for Tasklane
//!
//! CRUD surface for todos, gated by the authorization middleware and
//! scoped to the authenticated subject.

pub mod api;

pub use api::{TodoApiState, todo_router};
