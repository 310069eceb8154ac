//! Database repositories for Tasklane
//!
//! This module provides repository implementations for database operations.
//! Repositories encapsulate data access logic and provide a clean API for
//! business logic to interact with the database.

pub mod todo;
pub mod user;

pub use todo::{TodoRepository, TodoRepositoryError};
pub use user::{UserRepository, UserRepositoryError};
