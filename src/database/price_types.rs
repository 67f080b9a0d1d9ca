//! Price types (customer tiers).

use async_trait::async_trait;
use chrono::Utc;

use super::{Database, Repository};
use crate::error::{conflict_on_unique, AppError, Result};
use crate::models::PriceType;

const PRICE_TYPE_COLUMNS: &str = "id, code, name, is_default, created_at";

#[derive(Debug, Clone)]
pub struct PriceTypeRepository {
    db: Database,
}

impl PriceTypeRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn find_default(&self) -> Result<Option<PriceType>> {
        let price_type = sqlx::query_as::<_, PriceType>(&format!(
            "SELECT {PRICE_TYPE_COLUMNS} FROM price_types WHERE is_default = 1 LIMIT 1"
        ))
        .fetch_optional(self.db.pool())
        .await?;

        Ok(price_type)
    }

    /// Insert a price type. It becomes the default when asked to, or when
    /// it is the first one; either way the flag is unique afterwards.
    pub async fn create(&self, id: &str, code: &str, name: &str, is_default: bool) -> Result<PriceType> {
        let mut tx = self.db.begin().await?;

        let existing = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM price_types")
            .fetch_one(&mut *tx)
            .await?;
        let make_default = is_default || existing == 0;

        if make_default {
            sqlx::query("UPDATE price_types SET is_default = 0 WHERE is_default = 1")
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO price_types (id, code, name, is_default, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(name)
        .bind(make_default)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Price type code '{code}' already exists")))?;

        tx.commit().await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create price type".to_string()))
    }

    pub async fn update(&self, id: &str, code: &str, name: &str) -> Result<Option<PriceType>> {
        let result = sqlx::query("UPDATE price_types SET code = ?, name = ? WHERE id = ?")
            .bind(code)
            .bind(name)
            .bind(id)
            .execute(self.db.pool())
            .await
            .map_err(|e| conflict_on_unique(e, format!("Price type code '{code}' already exists")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }

    /// Make `id` the only default. Returns `false` when it does not exist.
    pub async fn set_default(&self, id: &str) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM price_types WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if found == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE price_types SET is_default = (id = ?)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Customers assigned to this tier.
    pub async fn customer_count(&self, id: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM customers WHERE price_type_id = ?",
        )
        .bind(id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl Repository for PriceTypeRepository {
    type Entity = PriceType;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<PriceType>> {
        let price_type = sqlx::query_as::<_, PriceType>(&format!(
            "SELECT {PRICE_TYPE_COLUMNS} FROM price_types WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(price_type)
    }

    /// Default first, then by code.
    async fn find_all(&self) -> Result<Vec<PriceType>> {
        let price_types = sqlx::query_as::<_, PriceType>(&format!(
            "SELECT {PRICE_TYPE_COLUMNS} FROM price_types ORDER BY is_default DESC, code"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(price_types)
    }

    /// Product prices of the tier go with it (cascade).
    /// Removes the type's product prices in the same transaction.
    async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM product_prices WHERE price_type_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM price_types WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM price_types")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_price_type_becomes_default() {
        let repo = PriceTypeRepository::new(Database::in_memory().await.unwrap());

        let retail = repo.create("pt1", "retail", "Retail", false).await.unwrap();
        let vip = repo.create("pt2", "vip", "VIP", false).await.unwrap();

        assert!(retail.is_default);
        assert!(!vip.is_default);
    }

    #[tokio::test]
    async fn set_default_keeps_a_single_default() {
        let repo = PriceTypeRepository::new(Database::in_memory().await.unwrap());
        repo.create("pt1", "retail", "Retail", false).await.unwrap();
        repo.create("pt2", "wholesale", "Wholesale", false).await.unwrap();

        assert!(repo.set_default("pt2").await.unwrap());
        assert!(!repo.set_default("missing").await.unwrap());

        let all = repo.find_all().await.unwrap();
        let defaults: Vec<_> = all.iter().filter(|p| p.is_default).map(|p| p.id.as_str()).collect();
        assert_eq!(defaults, vec!["pt2"]);
    }

    #[tokio::test]
    async fn duplicate_code_is_a_conflict() {
        let repo = PriceTypeRepository::new(Database::in_memory().await.unwrap());
        repo.create("pt1", "retail", "Retail", false).await.unwrap();

        let err = repo.create("pt2", "retail", "Again", false).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
