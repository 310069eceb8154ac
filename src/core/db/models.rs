//! Database models for tasklane
//!
//! This module defines the entity structs that map to PostgreSQL tables,
//! plus the response shapes derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the account finished email verification
    pub verified: bool,
    /// Opaque token mailed out at registration; presented back on /verify
    #[serde(skip_serializing)]
    pub verify_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User without sensitive data (for API responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            verified: user.verified,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

// ============================================================================
// Todo Model
// ============================================================================

/// Lifecycle state of a todo item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "pending",
            TodoStatus::InProgress => "in_progress",
            TodoStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Todo entity owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: i64,
    pub user_id: i64,
    pub description: String,
    /// Stored as plain text; new rows start as "pending"
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Todo shape returned by the API (owner id stays internal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoResponse {
    pub id: i64,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            description: todo.description,
            status: todo.status,
            created_at: todo.created_at,
            updated_at: todo.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_todo_status_serialization() {
        assert_eq!(
            serde_json::to_string(&TodoStatus::Pending).unwrap(),
            r#""pending""#
        );
        assert_eq!(
            serde_json::to_string(&TodoStatus::InProgress).unwrap(),
            r#""in_progress""#
        );
        assert_eq!(
            serde_json::to_string(&TodoStatus::Completed).unwrap(),
            r#""completed""#
        );
    }

    #[test]
    fn test_todo_status_deserialization() {
        let status: TodoStatus = serde_json::from_str(r#""in_progress""#).unwrap();
        assert_eq!(status, TodoStatus::InProgress);

        let result: Result<TodoStatus, _> = serde_json::from_str(r#""paused""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_todo_status_as_str_matches_serde() {
        for status in [
            TodoStatus::Pending,
            TodoStatus::InProgress,
            TodoStatus::Completed,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!(r#""{}""#, status.as_str()));
        }
    }

    #[test]
    fn test_user_serialization_hides_secrets() {
        let user = User {
            id: 1,
            email: "user@example.com".to_string(),
            name: "user".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            verified: true,
            verify_token: "verify-me".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("verify-me"));
        assert!(json.contains("user@example.com"));
    }

    #[test]
    fn test_user_response_from_user() {
        let user = User {
            id: 7,
            email: "user@example.com".to_string(),
            name: "user".to_string(),
            password_hash: "hash".to_string(),
            verified: false,
            verify_token: "token".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response: UserResponse = user.into();
        assert_eq!(response.id, 7);
        assert_eq!(response.email, "user@example.com");
        assert!(!response.verified);
    }

    #[test]
    fn test_todo_response_from_todo() {
        let todo = Todo {
            id: 3,
            user_id: 7,
            description: "Buy milk please".to_string(),
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response: TodoResponse = todo.into();
        assert_eq!(response.id, 3);
        assert_eq!(response.status, "pending");

        // Owner id is not part of the response shape
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("user_id"));
    }
}
