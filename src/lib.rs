//! Tasklane - Todo backend services
//!
//! A small service suite behind a shared library: an auth service issuing and
//! policing session tokens, a todo/user API guarded by a remote authorization
//! gate, and a notification worker delivering account verification emails.

pub mod core;
