//! Todo repository for database operations
//!
//! Provides CRUD operations for todo items. Ownership checks live in the API
//! layer so a missing item and a foreign item can map to different statuses.

use sqlx::PgPool;

use crate::core::db::models::{Todo, TodoStatus};

/// Todo repository error types
#[derive(Debug, thiserror::Error)]
pub enum TodoRepositoryError {
    #[error("Todo not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Todo repository for database operations
#[derive(Clone)]
pub struct TodoRepository {
    pool: PgPool,
}

impl TodoRepository {
    /// Create a new todo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new todo item for a user (new items always start pending)
    pub async fn create(
        &self,
        user_id: i64,
        description: &str,
    ) -> Result<Todo, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            INSERT INTO todos (user_id, description, status)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, description, status, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(description)
        .bind(TodoStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(todo)
    }

    /// Find a todo by ID (no ownership check)
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Todo>, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            SELECT id, user_id, description, status, created_at, updated_at
            FROM todos
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(todo)
    }

    /// Replace a todo's description and status
    pub async fn update(
        &self,
        id: i64,
        description: &str,
        status: TodoStatus,
    ) -> Result<Todo, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(
            r#"
            UPDATE todos
            SET description = $2, status = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, description, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(description)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(TodoRepositoryError::NotFound)?;

        Ok(todo)
    }

    /// Delete a todo by ID
    pub async fn delete(&self, id: i64) -> Result<bool, TodoRepositoryError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // ========================================================================
    // Error Tests
    // ========================================================================

    #[test]
    fn test_todo_repository_error_display() {
        let err = TodoRepositoryError::NotFound;
        assert_eq!(format!("{}", err), "Todo not found");
    }

    #[test]
    fn test_todo_repository_error_debug() {
        let err = TodoRepositoryError::NotFound;
        let debug = format!("{:?}", err);
        assert!(debug.contains("NotFound"));
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    async fn create_test_pool() -> PgPool {
        use crate::core::db::pool::{DbConfig, create_pool_with_migrations};

        let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
        create_pool_with_migrations(&config)
            .await
            .expect("Failed to create test pool")
    }

    async fn setup_test_user() -> (PgPool, i64) {
        let pool = create_test_pool().await;

        let unique_email = format!("todo_test_{}@example.com", Uuid::new_v4());

        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO users (email, name, password_hash, verified, verify_token)
            VALUES ($1, 'todo test user', 'test_hash', TRUE, $2)
            RETURNING id
            "#,
        )
        .bind(&unique_email)
        .bind(Uuid::new_v4().to_string())
        .fetch_one(&pool)
        .await
        .expect("Failed to create test user");

        (pool, row.0)
    }

    async fn cleanup_test_user(pool: &PgPool, user_id: i64) {
        // Todos are deleted by CASCADE
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(pool)
            .await
            .expect("Failed to cleanup test user");
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_todo_starts_pending() {
        let (pool, user_id) = setup_test_user().await;
        let repo = TodoRepository::new(pool.clone());

        let todo = repo.create(user_id, "Buy groceries").await.unwrap();

        assert_eq!(todo.user_id, user_id);
        assert_eq!(todo.description, "Buy groceries");
        assert_eq!(todo.status, "pending");

        cleanup_test_user(&pool, user_id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_find_by_id() {
        let (pool, user_id) = setup_test_user().await;
        let repo = TodoRepository::new(pool.clone());

        let created = repo.create(user_id, "Find me later").await.unwrap();

        let found = repo.find_by_id(created.id).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, created.id);

        let missing = repo.find_by_id(i64::MAX).await.unwrap();
        assert!(missing.is_none());

        cleanup_test_user(&pool, user_id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_update_replaces_description_and_status() {
        let (pool, user_id) = setup_test_user().await;
        let repo = TodoRepository::new(pool.clone());

        let created = repo.create(user_id, "Original text").await.unwrap();

        let updated = repo
            .update(created.id, "Rewritten text", TodoStatus::Completed)
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.description, "Rewritten text");
        assert_eq!(updated.status, "completed");

        cleanup_test_user(&pool, user_id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_update_nonexistent_todo() {
        let (pool, user_id) = setup_test_user().await;
        let repo = TodoRepository::new(pool.clone());

        let result = repo
            .update(i64::MAX, "Nothing here", TodoStatus::Pending)
            .await;
        assert!(matches!(result, Err(TodoRepositoryError::NotFound)));

        cleanup_test_user(&pool, user_id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_delete_todo() {
        let (pool, user_id) = setup_test_user().await;
        let repo = TodoRepository::new(pool.clone());

        let created = repo.create(user_id, "Delete me").await.unwrap();

        let deleted = repo.delete(created.id).await.unwrap();
        assert!(deleted);

        let found = repo.find_by_id(created.id).await.unwrap();
        assert!(found.is_none());

        let deleted_again = repo.delete(created.id).await.unwrap();
        assert!(!deleted_again);

        cleanup_test_user(&pool, user_id).await;
    }
}
