//! # Services (business logic layer)
//!
//! ```text
//! ┌─────────────────┐
//! │    API Layer    │  <-- HTTP handlers (axum)
//! ├─────────────────┤
//! │  Service Layer  │  <-- rules, pricing, workflows
//! ├─────────────────┤
//! │ Repository Layer│  <-- SQL
//! ├─────────────────┤
//! │    Database     │  <-- SQLite
//! └─────────────────┘
//! ```

mod pricing;
mod catalog_service;
mod price_type_service;
mod customer_service;
mod order_service;
mod translation_service;
mod partnership_service;
mod stats_service;
mod auth_service;

pub use pricing::*;
pub use catalog_service::*;
pub use price_type_service::*;
pub use customer_service::*;
pub use order_service::*;
pub use translation_service::*;
pub use partnership_service::*;
pub use stats_service::*;
pub use auth_service::*;

use std::sync::Arc;

use crate::{
    api::middleware::RateLimiterState,
    config::Config,
    database::{
        CategoryRepository, CustomerRepository, Database, OrderRepository, PartnershipRepository,
        PriceTypeRepository, ProductRepository, TranslationRepository, UserRepository,
    },
    error::{AppError, Result},
    models::{Claims, Role},
};

// =====================================
// Application State
// =====================================
/// Shared by every handler; cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Database,
    pub catalog_service: Arc<CatalogService>,
    pub price_type_service: Arc<PriceTypeService>,
    pub customer_service: Arc<CustomerService>,
    pub order_service: Arc<OrderService>,
    pub translation_service: Arc<TranslationService>,
    pub partnership_service: Arc<PartnershipService>,
    pub stats_service: Arc<StatsService>,
    pub auth_service: Arc<AuthService>,
    pub rate_limiter: RateLimiterState,
}

impl AppState {
    #[must_use]
    pub fn new(db: Database, config: Config) -> Self {
        let config = Arc::new(config);

        let categories = CategoryRepository::new(db.clone());
        let price_types = PriceTypeRepository::new(db.clone());
        let products = ProductRepository::new(db.clone());
        let customers = CustomerRepository::new(db.clone());
        let orders = OrderRepository::new(db.clone());
        let partnerships = PartnershipRepository::new(db.clone());

        let catalog_service = Arc::new(CatalogService::new(
            categories,
            price_types.clone(),
            products.clone(),
        ));
        let price_type_service = Arc::new(PriceTypeService::new(price_types.clone()));
        let customer_service = Arc::new(CustomerService::new(customers.clone(), price_types));
        let order_service = Arc::new(OrderService::new(
            orders.clone(),
            catalog_service.clone(),
            customer_service.clone(),
        ));
        let translation_service = Arc::new(TranslationService::new(
            TranslationRepository::new(db.clone()),
            config.default_locale,
        ));
        let partnership_service = Arc::new(PartnershipService::new(partnerships.clone()));
        let stats_service = Arc::new(StatsService::new(products, customers, orders, partnerships));
        let auth_service = Arc::new(AuthService::new(
            UserRepository::new(db.clone()),
            customer_service.clone(),
            config.clone(),
        ));
        let rate_limiter = RateLimiterState::new(config.rate_limit_per_minute, config.rate_limit_burst);

        Self {
            config,
            db,
            catalog_service,
            price_type_service,
            customer_service,
            order_service,
            translation_service,
            partnership_service,
            stats_service,
            auth_service,
            rate_limiter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Price tier of the caller: a customer's own tier, else the default.
    /// Tokens of customers that no longer exist are treated as guests.
    pub async fn pricing_tier(&self, claims: Option<&Claims>) -> Result<Option<PriceTier>> {
        let customer_tier = match claims {
            Some(claims) if claims.role == Role::Customer => {
                match self.customer_service.get(&claims.sub).await {
                    Ok(customer) => customer.price_type_id,
                    Err(AppError::NotFound(_)) => None,
                    Err(e) => return Err(e),
                }
            }
            _ => None,
        };

        self.catalog_service.tier_for(customer_tier.as_deref()).await
    }
}

// =====================================
// Service Trait
// =====================================
/// Marker for service types shared across request tasks.
pub trait Service: Send + Sync {}
