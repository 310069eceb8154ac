//! Core domain logic shared by the tasklane service binaries

pub mod auth;
pub mod config;
pub mod db;
pub mod todos;
pub mod users;
pub mod verification;
