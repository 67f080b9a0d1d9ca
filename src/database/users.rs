//! Staff accounts.

use async_trait::async_trait;
use chrono::Utc;

use super::{Database, Repository};
use crate::error::{AppError, Result};
use crate::models::{CreateUser, User};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct UserRepository {
    db: Database,
}

impl UserRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Email lookup is case-insensitive; emails are stored lowercased.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    pub async fn create(&self, create_user: &CreateUser) -> Result<User> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(&create_user.id)
        .bind(&create_user.email)
        .bind(&create_user.password_hash)
        .bind(&create_user.name)
        .bind(create_user.role)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| crate::error::conflict_on_unique(e, "Email already registered"))?;

        self.find_by_id(&create_user.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create user".to_string()))
    }
}

#[async_trait]
impl Repository for UserRepository {
    type Entity = User;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(users)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
