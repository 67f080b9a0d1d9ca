//! UI translation strings.

use std::collections::BTreeMap;

use chrono::Utc;

use super::Database;
use crate::error::Result;
use crate::models::Translation;

#[derive(Debug, Clone)]
pub struct TranslationRepository {
    db: Database,
}

impl TranslationRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// `key -> value` for one locale.
    pub async fn bundle(&self, locale: &str) -> Result<BTreeMap<String, String>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT key, value FROM translations WHERE locale = ?",
        )
        .bind(locale)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Every row of every locale, ordered by key.
    pub async fn find_all(&self) -> Result<Vec<Translation>> {
        let rows = sqlx::query_as::<_, Translation>(
            "SELECT locale, key, value, updated_at FROM translations ORDER BY key, locale",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    pub async fn upsert(&self, locale: &str, key: &str, value: &str) -> Result<Translation> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, Translation>(
            r#"
            INSERT INTO translations (locale, key, value, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (locale, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            RETURNING locale, key, value, updated_at
            "#,
        )
        .bind(locale)
        .bind(key)
        .bind(value)
        .bind(now)
        .fetch_one(self.db.pool())
        .await?;

        Ok(row)
    }

    /// Upsert many entries of one locale in a single transaction.
    pub async fn import(&self, locale: &str, entries: &BTreeMap<String, String>) -> Result<usize> {
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        for (key, value) in entries {
            sqlx::query(
                r#"
                INSERT INTO translations (locale, key, value, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT (locale, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(locale)
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(entries.len())
    }

    /// Remove `key` from every locale; returns the number of rows removed.
    pub async fn delete_key(&self, key: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM translations WHERE key = ?")
            .bind(key)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_replaces_value() {
        let repo = TranslationRepository::new(Database::in_memory().await.unwrap());

        repo.upsert("uz", "cart.title", "Savat").await.unwrap();
        let row = repo.upsert("uz", "cart.title", "Savatcha").await.unwrap();
        assert_eq!(row.value, "Savatcha");

        let bundle = repo.bundle("uz").await.unwrap();
        assert_eq!(bundle.len(), 1);
        assert_eq!(bundle["cart.title"], "Savatcha");
    }

    #[tokio::test]
    async fn delete_key_hits_every_locale() {
        let repo = TranslationRepository::new(Database::in_memory().await.unwrap());
        let entries: BTreeMap<String, String> =
            [("cart.title".to_string(), "Корзина".to_string())].into_iter().collect();

        repo.upsert("uz", "cart.title", "Savat").await.unwrap();
        assert_eq!(repo.import("ru", &entries).await.unwrap(), 1);

        assert_eq!(repo.delete_key("cart.title").await.unwrap(), 2);
        assert_eq!(repo.delete_key("cart.title").await.unwrap(), 0);
    }
}
