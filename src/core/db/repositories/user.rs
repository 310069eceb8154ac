//! User repository for database operations
//!
//! Provides account storage with secure password hashing using bcrypt, plus
//! the verification-token lookups used by the email verification callback.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::User;

/// Cost factor for bcrypt hashing (12 is recommended for production)
const BCRYPT_COST: u32 = 12;

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a password using bcrypt with automatic salt generation
    pub fn hash_password(password: &str) -> Result<String, UserRepositoryError> {
        bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Verify a password against a bcrypt hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserRepositoryError> {
        bcrypt::verify(password, hash).map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Create a new unverified user with a plain text password (will be hashed).
    ///
    /// A fresh verification token is minted for the account; it travels to the
    /// user by email and comes back through the verification callback.
    pub async fn create(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<User, UserRepositoryError> {
        // Check if email already exists
        if self.find_by_email(email).await?.is_some() {
            return Err(UserRepositoryError::EmailAlreadyExists);
        }

        // Hash the password with bcrypt (includes automatic salt)
        let password_hash = Self::hash_password(password)?;

        let verify_token = Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash, verified, verify_token)
            VALUES ($1, $2, $3, FALSE, $4)
            RETURNING id, email, name, password_hash, verified, verify_token, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(&password_hash)
        .bind(&verify_token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, verified, verify_token, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, verified, verify_token, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by verification token
    pub async fn find_by_verify_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, verified, verify_token, created_at, updated_at
            FROM users
            WHERE verify_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Whether a user with the given ID exists
    pub async fn exists(&self, id: i64) -> Result<bool, UserRepositoryError> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }

    /// Mark a user's account as verified.
    ///
    /// Idempotent: marking an already-verified account succeeds again.
    pub async fn mark_verified(&self, id: i64) -> Result<(), UserRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET verified = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserRepositoryError::NotFound);
        }

        Ok(())
    }

    /// Update user's password (takes plain text, hashes it)
    pub async fn update_password(
        &self,
        id: i64,
        new_password: &str,
    ) -> Result<(), UserRepositoryError> {
        let password_hash = Self::hash_password(new_password)?;

        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&password_hash)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserRepositoryError::NotFound);
        }

        Ok(())
    }

    /// Delete a user by ID
    pub async fn delete(&self, id: i64) -> Result<bool, UserRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Authenticate a user by email and password
    /// Returns the user if credentials are valid, None otherwise
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let user = match self.find_by_email(email).await? {
            Some(u) => u,
            None => return Ok(None),
        };

        let is_valid = Self::verify_password(password, &user.password_hash)?;

        if is_valid { Ok(Some(user)) } else { Ok(None) }
    }
}
