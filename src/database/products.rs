//! Products and their per-tier prices.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use super::{contains_pattern, search_text, Database, Repository};
use crate::error::{conflict_on_unique, AppError, Result};
use crate::models::{Pagination, Product, ProductPrice};

const PRODUCT_COLUMNS: &str = "id, sku, category_id, name_uz, name_ru, name_tr, \
     description_uz, description_ru, description_tr, image_url, volume_ml, \
     units_per_box, in_stock, is_active, created_at, updated_at";

/// Listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<String>,
    /// Matched against the SKU and every name
    pub search: Option<String>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: Database,
}

impl ProductRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert a product together with its prices.
    pub async fn create(&self, product: &Product, prices: &[ProductPrice]) -> Result<Product> {
        let mut tx = self.db.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}, search_text) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.category_id)
        .bind(&product.name_uz)
        .bind(&product.name_ru)
        .bind(&product.name_tr)
        .bind(&product.description_uz)
        .bind(&product.description_ru)
        .bind(&product.description_tr)
        .bind(&product.image_url)
        .bind(product.volume_ml)
        .bind(product.units_per_box)
        .bind(product.in_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .bind(product_search_text(product))
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, format!("SKU '{}' already exists", product.sku)))?;

        for price in prices {
            insert_price(&mut tx, &product.id, price).await?;
        }

        tx.commit().await?;

        self.find_by_id(&product.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create product".to_string()))
    }

    /// Overwrite every column but `id` and `created_at`.
    pub async fn update(&self, product: &Product) -> Result<Option<Product>> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET sku = ?, category_id = ?, name_uz = ?, name_ru = ?, name_tr = ?,
                description_uz = ?, description_ru = ?, description_tr = ?,
                image_url = ?, volume_ml = ?, units_per_box = ?, in_stock = ?,
                is_active = ?, updated_at = ?, search_text = ?
            WHERE id = ?
            "#,
        )
        .bind(&product.sku)
        .bind(&product.category_id)
        .bind(&product.name_uz)
        .bind(&product.name_ru)
        .bind(&product.name_tr)
        .bind(&product.description_uz)
        .bind(&product.description_ru)
        .bind(&product.description_tr)
        .bind(&product.image_url)
        .bind(product.volume_ml)
        .bind(product.units_per_box)
        .bind(product.in_stock)
        .bind(product.is_active)
        .bind(product.updated_at)
        .bind(product_search_text(product))
        .bind(&product.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| conflict_on_unique(e, format!("SKU '{}' already exists", product.sku)))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(&product.id).await
    }

    /// One page of products matching `filter`, plus the total match count.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        pagination: &Pagination,
    ) -> Result<(Vec<Product>, i64)> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products");
        push_filter(&mut count_query, filter);
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        push_filter(&mut query, filter);
        query
            .push(" ORDER BY name_uz, sku LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let products = query
            .build_query_as::<Product>()
            .fetch_all(self.db.pool())
            .await?;

        Ok((products, total))
    }

    /// Products with the given ids, in no particular order. Missing ids are
    /// simply absent from the result.
    pub async fn find_many(&self, ids: &[String]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let products = query
            .build_query_as::<Product>()
            .fetch_all(self.db.pool())
            .await?;

        Ok(products)
    }

    /// Every tier price of one product.
    pub async fn prices(&self, product_id: &str) -> Result<Vec<ProductPrice>> {
        let prices = sqlx::query_as::<_, ProductPrice>(
            r#"
            SELECT product_id, price_type_id, unit_price, box_price
            FROM product_prices
            WHERE product_id = ?
            ORDER BY price_type_id
            "#,
        )
        .bind(product_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(prices)
    }

    /// Prices of `product_ids` restricted to `price_type_ids`; used to price
    /// listings and carts for one tier plus the default fallback.
    pub async fn prices_for(
        &self,
        product_ids: &[String],
        price_type_ids: &[&str],
    ) -> Result<Vec<ProductPrice>> {
        if product_ids.is_empty() || price_type_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(
            "SELECT product_id, price_type_id, unit_price, box_price FROM product_prices WHERE product_id IN (",
        );
        let mut separated = query.separated(", ");
        for id in product_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") AND price_type_id IN (");

        let mut separated = query.separated(", ");
        for id in price_type_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let prices = query
            .build_query_as::<ProductPrice>()
            .fetch_all(self.db.pool())
            .await?;

        Ok(prices)
    }

    /// Replace the whole price list of a product.
    pub async fn set_prices(&self, product_id: &str, prices: &[ProductPrice]) -> Result<Vec<ProductPrice>> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM product_prices WHERE product_id = ?")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        for price in prices {
            insert_price(&mut tx, product_id, price).await?;
        }

        tx.commit().await?;

        self.prices(product_id).await
    }

    /// `(all, active)` product counts.
    pub async fn counts(&self) -> Result<(i64, i64)> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(is_active), 0) FROM products",
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(counts)
    }
}

async fn insert_price(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    product_id: &str,
    price: &ProductPrice,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO product_prices (product_id, price_type_id, unit_price, box_price)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(product_id)
    .bind(&price.price_type_id)
    .bind(price.unit_price)
    .bind(price.box_price)
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        conflict_on_unique(
            e,
            format!("Duplicate price for price type '{}'", price.price_type_id),
        )
    })?;

    Ok(())
}

fn product_search_text(product: &Product) -> String {
    search_text([
        product.sku.as_str(),
        product.name_uz.as_str(),
        product.name_ru.as_str(),
        product.name_tr.as_str(),
    ])
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    let mut keyword = " WHERE ";

    if !filter.include_inactive {
        query.push(keyword).push("is_active = 1");
        keyword = " AND ";
    }

    if let Some(category_id) = &filter.category_id {
        query.push(keyword).push("category_id = ").push_bind(category_id.clone());
        keyword = " AND ";
    }

    if let Some(search) = &filter.search {
        query
            .push(keyword)
            .push("search_text LIKE ")
            .push_bind(contains_pattern(search))
            .push(" ESCAPE '\\'");
    }
}

#[async_trait]
impl Repository for ProductRepository {
    type Entity = Product;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(product)
    }

    async fn find_all(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name_uz, sku"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(products)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::database::PriceTypeRepository;

    fn product(id: &str, sku: &str, name: &str, active: bool) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            sku: sku.to_string(),
            category_id: None,
            name_uz: name.to_string(),
            name_ru: String::new(),
            name_tr: String::new(),
            description_uz: String::new(),
            description_ru: String::new(),
            description_tr: String::new(),
            image_url: None,
            volume_ml: Some(500),
            units_per_box: 12,
            in_stock: true,
            is_active: active,
            created_at: now,
            updated_at: now,
        }
    }

    fn price(price_type_id: &str, unit_price: i64) -> ProductPrice {
        ProductPrice {
            product_id: String::new(),
            price_type_id: price_type_id.to_string(),
            unit_price,
            box_price: None,
        }
    }

    #[tokio::test]
    async fn list_filters_inactive_and_searches_names() {
        let db = Database::in_memory().await.unwrap();
        let repo = ProductRepository::new(db);

        repo.create(&product("p1", "COLA-05", "Coca-Cola", true), &[]).await.unwrap();
        repo.create(&product("p2", "FANTA-05", "Fanta", true), &[]).await.unwrap();
        repo.create(&product("p3", "OLD-1", "Old cola", false), &[]).await.unwrap();

        let page = Pagination::new(None, None);

        let (active, total) = repo.list(&ProductFilter::default(), &page).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(active.len(), 2);

        let filter = ProductFilter {
            search: Some("COLA".to_string()),
            include_inactive: true,
            ..Default::default()
        };
        let (found, total) = repo.list(&filter, &page).await.unwrap();
        assert_eq!(total, 2);
        assert!(found.iter().all(|p| p.name_uz.to_lowercase().contains("cola")));
    }

    #[tokio::test]
    async fn search_folds_cyrillic_case() {
        let repo = ProductRepository::new(Database::in_memory().await.unwrap());
        let mut water = product("p1", "SUV-1", "Suv", true);
        water.name_ru = "Вода".to_string();
        repo.create(&water, &[]).await.unwrap();
        repo.create(&product("p2", "COLA-05", "Cola", true), &[]).await.unwrap();

        let page = Pagination::new(None, None);
        for needle in ["Вода", "вода", "ВОДА", "од"] {
            let filter = ProductFilter {
                search: Some(needle.to_string()),
                ..Default::default()
            };
            let (found, total) = repo.list(&filter, &page).await.unwrap();
            assert_eq!(total, 1, "search {needle:?}");
            assert_eq!(found[0].id, "p1");
        }

        // renamed products are found under their new name only
        water.name_ru = "Минеральная".to_string();
        repo.update(&water).await.unwrap();
        let filter = ProductFilter {
            search: Some("МИНЕРАЛ".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter, &page).await.unwrap().1, 1);
        let filter = ProductFilter {
            search: Some("вода".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter, &page).await.unwrap().1, 0);
    }

    #[tokio::test]
    async fn search_wildcards_match_literally() {
        let repo = ProductRepository::new(Database::in_memory().await.unwrap());
        repo.create(&product("p1", "COLA-05", "Cola", true), &[]).await.unwrap();
        repo.create(&product("p2", "PROMO_1", "Promo 100%", true), &[]).await.unwrap();

        let page = Pagination::new(None, None);
        for (needle, expected) in [("_", 1), ("%", 1), ("o_1", 1), ("c%a", 0)] {
            let filter = ProductFilter {
                search: Some(needle.to_string()),
                ..Default::default()
            };
            assert_eq!(repo.list(&filter, &page).await.unwrap().1, expected, "search {needle:?}");
        }
    }

    #[tokio::test]
    async fn set_prices_replaces_the_list() {
        let db = Database::in_memory().await.unwrap();
        let tiers = PriceTypeRepository::new(db.clone());
        tiers.create("retail", "retail", "Retail", true).await.unwrap();
        tiers.create("vip", "vip", "VIP", false).await.unwrap();

        let repo = ProductRepository::new(db);
        repo.create(&product("p1", "COLA-05", "Cola", true), &[price("retail", 6000)])
            .await
            .unwrap();

        let prices = repo
            .set_prices("p1", &[price("vip", 5000), price("retail", 6500)])
            .await
            .unwrap();
        assert_eq!(prices.len(), 2);

        let vip_only = repo
            .prices_for(&["p1".to_string()], &["vip"])
            .await
            .unwrap();
        assert_eq!(vip_only.len(), 1);
        assert_eq!(vip_only[0].unit_price, 5000);
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict() {
        let repo = ProductRepository::new(Database::in_memory().await.unwrap());
        repo.create(&product("p1", "COLA-05", "Cola", true), &[]).await.unwrap();

        let err = repo
            .create(&product("p2", "COLA-05", "Cola again", true), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
