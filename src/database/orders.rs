//! Orders and their line items.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

use super::{Database, Repository};
use crate::error::{conflict_on_unique, AppError, Result};
use crate::models::{Order, OrderItem, OrderStatus, Pagination};

const ORDER_COLUMNS: &str = "id, order_number, customer_id, customer_name, phone, address, \
     latitude, longitude, note, price_type_id, status, subtotal, total_quantity, \
     created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, product_name, unit, quantity, unit_price, line_total, position";

#[derive(Debug, Clone)]
pub struct OrderRepository {
    db: Database,
}

impl OrderRepository {
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Insert the order and all of its items, or nothing.
    ///
    /// # Errors
    /// `Conflict` when the order number is already taken.
    pub async fn create(&self, order: &Order, items: &[OrderItem]) -> Result<Order> {
        let mut tx = self.db.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO orders ({ORDER_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.customer_id)
        .bind(&order.customer_name)
        .bind(&order.phone)
        .bind(&order.address)
        .bind(order.latitude)
        .bind(order.longitude)
        .bind(&order.note)
        .bind(&order.price_type_id)
        .bind(order.status)
        .bind(order.subtotal)
        .bind(order.total_quantity)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, format!("Order number '{}' is taken", order.order_number)))?;

        for item in items {
            sqlx::query(&format!(
                "INSERT INTO order_items ({ITEM_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
            ))
            .bind(&item.id)
            .bind(&order.id)
            .bind(&item.product_id)
            .bind(&item.product_name)
            .bind(item.unit)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.line_total)
            .bind(item.position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_by_id(&order.id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to create order".to_string()))
    }

    pub async fn items(&self, order_id: &str) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ? ORDER BY position"
        ))
        .bind(order_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(items)
    }

    /// Newest first, optionally restricted to one status.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        pagination: &Pagination,
    ) -> Result<(Vec<Order>, i64)> {
        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders");
        if let Some(status) = status {
            count_query.push(" WHERE status = ").push_bind(status);
        }
        let total: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.db.pool())
            .await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders"));
        if let Some(status) = status {
            query.push(" WHERE status = ").push_bind(status);
        }
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let orders = query
            .build_query_as::<Order>()
            .fetch_all(self.db.pool())
            .await?;

        Ok((orders, total))
    }

    pub async fn find_by_customer(&self, customer_id: &str) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE customer_id = ? ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(orders)
    }

    /// Move `id` from `from` to `to`. Returns `false` when the order is no
    /// longer in `from`, so concurrent updates cannot skip a step.
    pub async fn update_status(&self, id: &str, from: OrderStatus, to: OrderStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(to)
            .bind(Utc::now())
            .bind(id)
            .bind(from)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>> {
        let rows = sqlx::query_as::<_, (OrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM orders GROUP BY status",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows)
    }

    pub async fn delivered_revenue(&self) -> Result<i64> {
        let revenue = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(subtotal), 0) FROM orders WHERE status = 'delivered'",
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(revenue)
    }
}

#[async_trait]
impl Repository for OrderRepository {
    type Entity = Order;
    type Id = str;

    async fn find_by_id(&self, id: &str) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(order)
    }

    async fn find_all(&self) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(orders)
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count)
    }
}
