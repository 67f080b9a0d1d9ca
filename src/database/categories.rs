//! Product categories.

use async_trait::async_trait;

use super::{Database, Repository};
use crate::error::{conflict_on_unique, AppError, Result};
use crate::models::{Category, CategoryRequest};

const CATEGORY_COLUMNS: &str = "id, slug, name_uz, name_ru, name_tr, sort_order";

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    db: Database,
}

impl CategoryRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create(&self, id: &str, request: &CategoryRequest) -> Result<Category> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, slug, name_uz, name_ru, name_tr, sort_order)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&request.slug)
        .bind(&request.name.uz)
        .bind(&request.name.ru)
        .bind(&request.name.tr)
        .bind(request.sort_order)
        .execute(self.db.pool())
        .await
        .map_err(|e| conflict_on_unique(e, format!("Category '{}' already exists", request.slug)))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create category".to_string()))
    }

    pub async fn update(&self, id: &str, request: &CategoryRequest) -> Result<Option<Category>> {
        let result = sqlx::query(
            r#"
            UPDATE categories
            SET slug = ?, name_uz = ?, name_ru = ?, name_tr = ?, sort_order = ?
            WHERE id = ?
            "#,
        )
        .bind(&request.slug)
        .bind(&request.name.uz)
        .bind(&request.name.ru)
        .bind(&request.name.tr)
        .bind(request.sort_order)
        .bind(id)
        .execute(self.db.pool())
        .await
        .map_err(|e| conflict_on_unique(e, format!("Category '{}' already exists", request.slug)))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    pub async fn exists(&self, id: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE id = ?")
            .bind(id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count > 0)
    }
}

#[async_trait]
impl Repository for CategoryRepository {
    type Entity = Category;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(category)
    }

    async fn find_all(&self) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY sort_order, slug"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(categories)
    }

    /// Products of the category are detached, not deleted.
    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
