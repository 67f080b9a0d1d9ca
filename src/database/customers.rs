//! Shop customers.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::{contains_pattern, search_text, Database, Repository};
use crate::error::{conflict_on_unique, AppError, Result};
use crate::models::{Customer, NewCustomer, Pagination};

const CUSTOMER_COLUMNS: &str = "id, nickname, full_name, phone, address, latitude, longitude, \
     price_type_id, password_hash, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: Database,
}

impl CustomerRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// `nickname` must already be normalised.
    pub async fn find_by_nickname(&self, nickname: &str) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE nickname = ?"
        ))
        .bind(nickname)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(customer)
    }

    pub async fn nickname_exists(&self, nickname: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE nickname = ?")
            .bind(nickname)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count > 0)
    }

    pub async fn create(&self, customer: &NewCustomer) -> Result<Customer> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO customers (id, nickname, full_name, phone, address, latitude, longitude,
                                   price_type_id, password_hash, is_active, search_text,
                                   created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.nickname)
        .bind(&customer.full_name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.latitude)
        .bind(customer.longitude)
        .bind(&customer.price_type_id)
        .bind(&customer.password_hash)
        .bind(customer_search_text(&customer.nickname, &customer.full_name, &customer.phone))
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(|e| conflict_on_unique(e, format!("Nickname '{}' is taken", customer.nickname)))?;

        self.find_by_id(&customer.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create customer".to_string()))
    }

    /// Overwrite the editable columns of an existing customer.
    pub async fn update(&self, customer: &Customer) -> Result<Option<Customer>> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET nickname = ?, full_name = ?, phone = ?, address = ?, latitude = ?, longitude = ?,
                price_type_id = ?, is_active = ?, search_text = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&customer.nickname)
        .bind(&customer.full_name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.latitude)
        .bind(customer.longitude)
        .bind(&customer.price_type_id)
        .bind(customer.is_active)
        .bind(customer_search_text(&customer.nickname, &customer.full_name, &customer.phone))
        .bind(Utc::now())
        .bind(&customer.id)
        .execute(self.db.pool())
        .await
        .map_err(|e| conflict_on_unique(e, format!("Nickname '{}' is taken", customer.nickname)))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(&customer.id).await
    }

    /// Search by nickname, name or phone; newest first.
    pub async fn list(&self, search: Option<&str>, pagination: &Pagination) -> Result<(Vec<Customer>, i64)> {
        let pattern = search.map(contains_pattern);

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM customers");
        push_search(&mut count_query, pattern.as_deref());
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {CUSTOMER_COLUMNS} FROM customers"));
        push_search(&mut query, pattern.as_deref());
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let customers = query
            .build_query_as::<Customer>()
            .fetch_all(self.db.pool())
            .await?;

        Ok((customers, total))
    }

    pub async fn count_active(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE is_active = 1")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

fn customer_search_text(nickname: &str, full_name: &str, phone: &str) -> String {
    search_text([nickname, full_name, phone])
}

fn push_search(query: &mut QueryBuilder<'_, Sqlite>, pattern: Option<&str>) {
    if let Some(pattern) = pattern {
        query
            .push(" WHERE search_text LIKE ")
            .push_bind(pattern.to_string())
            .push(" ESCAPE '\\'");
    }
}

#[async_trait]
impl Repository for CustomerRepository {
    type Entity = Customer;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(customer)
    }

    async fn find_all(&self) -> Result<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at DESC"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(customers)
    }

    /// Their orders stay, with the customer link cleared.
    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_customer(id: &str, nickname: &str) -> NewCustomer {
        NewCustomer {
            id: id.to_string(),
            nickname: nickname.to_string(),
            full_name: "Ali Valiyev".to_string(),
            phone: "+998901234567".to_string(),
            address: None,
            latitude: None,
            longitude: None,
            price_type_id: None,
            password_hash: None,
        }
    }

    #[tokio::test]
    async fn nickname_is_unique() {
        let repo = CustomerRepository::new(Database::in_memory().await.unwrap());
        repo.create(&new_customer("c1", "ali")).await.unwrap();

        assert!(repo.nickname_exists("ali").await.unwrap());
        let err = repo.create(&new_customer("c2", "ali")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn list_searches_name_and_phone() {
        let repo = CustomerRepository::new(Database::in_memory().await.unwrap());
        repo.create(&new_customer("c1", "ali")).await.unwrap();
        let mut other = new_customer("c2", "shop_42");
        other.full_name = "Bahor Market".to_string();
        other.phone = "+998711112233".to_string();
        repo.create(&other).await.unwrap();

        let page = Pagination::new(None, None);
        let (found, total) = repo.list(Some("bahor"), &page).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].nickname, "shop_42");

        let (found, _) = repo.list(Some("90123"), &page).await.unwrap();
        assert_eq!(found[0].nickname, "ali");

        let (_, total) = repo.list(None, &page).await.unwrap();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn list_search_folds_cyrillic_and_turkish_case() {
        let repo = CustomerRepository::new(Database::in_memory().await.unwrap());
        let mut ivan = new_customer("c1", "ivan");
        ivan.full_name = "Иван Петров".to_string();
        repo.create(&ivan).await.unwrap();
        let mut ozlem = new_customer("c2", "ozlem");
        ozlem.full_name = "ÖZLEM ÇELİK".to_string();
        repo.create(&ozlem).await.unwrap();

        let page = Pagination::new(None, None);
        for (needle, nickname) in [("Иван", "ivan"), ("ПЕТРОВ", "ivan"), ("özlem", "ozlem"), ("Çel", "ozlem")] {
            let (found, total) = repo.list(Some(needle), &page).await.unwrap();
            assert_eq!(total, 1, "search {needle:?}");
            assert_eq!(found[0].nickname, nickname);
        }

        let (_, total) = repo.list(Some("_"), &page).await.unwrap();
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn update_refreshes_search_text() {
        let repo = CustomerRepository::new(Database::in_memory().await.unwrap());
        let mut customer = repo.create(&new_customer("c1", "ali")).await.unwrap();

        customer.full_name = "Алишер Навои".to_string();
        repo.update(&customer).await.unwrap();

        let page = Pagination::new(None, None);
        assert_eq!(repo.list(Some("алишер"), &page).await.unwrap().1, 1);
        assert_eq!(repo.list(Some("valiyev"), &page).await.unwrap().1, 0);
    }
}
