//! # Database layer
//!
//! Connection pool, embedded migrations and one repository per table
//! group. Repositories are cheap to clone: they only hold the pool handle.

mod repository;
mod users;
mod price_types;
mod categories;
mod products;
mod customers;
mod orders;
mod translations;
mod partnerships;

pub use repository::*;
pub use users::*;
pub use price_types::*;
pub use categories::*;
pub use products::*;
pub use customers::*;
pub use orders::*;
pub use translations::*;
pub use partnerships::*;

use std::sync::Arc;
use std::time::Duration;

use sqlx::{
    migrate::Migrator,
    sqlite::{SqlitePool, SqlitePoolOptions},
};

use crate::error::Result;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

// =====================================
// Database Connection
// =====================================
/// Shared connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: Arc<SqlitePool>,
}

impl Database {
    /// Connect and create the parent directory of a file database if needed.
    ///
    /// # Arguments
    /// * `database_url` - e.g. `sqlite://data/store.db?mode=rwc`
    ///
    /// # Errors
    /// Fails when the directory cannot be created or the pool cannot connect.
    pub async fn connect(database_url: impl AsRef<str>) -> Result<Self> {
        let url = database_url.as_ref();

        if let Some(path) = url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .connect(url)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Fresh in-memory database with the schema applied.
    ///
    /// A single connection that never expires holds the data, so every
    /// query sees the same database.
    ///
    /// # Errors
    /// Fails when the pool or the migrations fail.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let db = Self {
            pool: Arc::new(pool),
        };

        db.migrate().await?;
        Ok(db)
    }

    /// Apply pending migrations.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&*self.pool).await?;
        Ok(())
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&*self.pool).await?;
        Ok(())
    }

    /// Start a transaction; it rolls back on drop unless committed.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}

// =====================================
// Search Helpers
// =====================================
/// Lowercased haystack stored in a row's `search_text` column.
///
/// SQLite's `lower()` and `LIKE` fold ASCII only, so Cyrillic and Turkish
/// text is folded here and searches match against this column.
pub(crate) fn search_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("\n")
}

/// `LIKE` pattern matching `needle` anywhere, for use with `ESCAPE '\'`.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
