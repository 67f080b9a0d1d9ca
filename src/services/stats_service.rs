//! Back office dashboard numbers.

use std::collections::BTreeMap;

use super::Service;
use crate::{
    database::{CustomerRepository, OrderRepository, PartnershipRepository, ProductRepository},
    error::Result,
    models::{DashboardStats, OrderStatus, PartnershipStatus},
};

#[derive(Debug, Clone)]
pub struct StatsService {
    products: ProductRepository,
    customers: CustomerRepository,
    orders: OrderRepository,
    partnerships: PartnershipRepository,
}

impl Service for StatsService {}

impl StatsService {
    #[must_use]
    pub fn new(
        products: ProductRepository,
        customers: CustomerRepository,
        orders: OrderRepository,
        partnerships: PartnershipRepository,
    ) -> Self {
        Self {
            products,
            customers,
            orders,
            partnerships,
        }
    }

    pub async fn dashboard(&self) -> Result<DashboardStats> {
        let (total_products, active_products) = self.products.counts().await?;

        // every status is listed, with zero when there are no such orders
        let mut orders_by_status: BTreeMap<String, i64> = OrderStatus::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for (status, count) in self.orders.count_by_status().await? {
            orders_by_status.insert(status.as_str().to_string(), count);
        }

        Ok(DashboardStats {
            total_products,
            active_products,
            active_customers: self.customers.count_active().await?,
            orders_by_status,
            delivered_revenue: self.orders.delivered_revenue().await?,
            pending_partnerships: self
                .partnerships
                .count_by_status(PartnershipStatus::Pending)
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    #[tokio::test]
    async fn empty_store_reports_zeroes() {
        let db = Database::in_memory().await.unwrap();
        let stats = StatsService::new(
            ProductRepository::new(db.clone()),
            CustomerRepository::new(db.clone()),
            OrderRepository::new(db.clone()),
            PartnershipRepository::new(db),
        )
        .dashboard()
        .await
        .unwrap();

        assert_eq!(stats.total_products, 0);
        assert_eq!(stats.delivered_revenue, 0);
        assert_eq!(stats.orders_by_status.len(), 5);
        assert!(stats.orders_by_status.values().all(|&n| n == 0));
    }
}
