//! # API layer
//!
//! Routing and HTTP plumbing.
//!
//! ## Storefront
//! - `GET /api/i18n/:locale` - UI strings
//! - `GET /api/categories`, `GET /api/products`, `GET /api/products/:id`
//! - `POST /api/cart/quote` - price a cart
//! - `POST /api/orders` - checkout (rate limited)
//! - `GET /api/customers/nickname-available`
//! - `POST /api/auth/register`, `/login`, `/staff/login` (rate limited), `/refresh`
//! - `GET /api/me`, `GET /api/me/orders`
//! - `POST /api/partnerships` (rate limited)
//! - `GET /health`
//!
//! ## Back office
//! Everything under `/api/admin` requires a staff token; deleting price
//! types and customers requires an admin.

mod extractors;
mod handlers;
pub mod middleware;

pub use extractors::*;
pub use handlers::*;
pub use middleware::*;

use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::{config::Config, database::Database, services::AppState};

// =====================================
// Router Builder
// =====================================
/// Build the application from a database and configuration.
pub fn create_router(db: Database, config: Config) -> Router {
    router(AppState::new(db, config))
}

/// Build the application around an existing state, so callers can keep a
/// handle on the services.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes(&state))
        .route("/health", get(handlers::health::health_check))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum_middleware::from_fn(middleware::request_id))
                .layer(axum_middleware::from_fn(middleware::request_timing))
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(axum_middleware::from_fn(middleware::security_headers)),
        )
        .with_state(state)
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(storefront_routes())
        .merge(limited_routes(state))
        .nest("/admin", admin_routes(state))
}

/// Public reads.
fn storefront_routes() -> Router<AppState> {
    use handlers::{auth, catalog, customers, i18n};

    Router::new()
        .route("/i18n/:locale", get(i18n::bundle))
        .route("/categories", get(catalog::list_categories))
        .route("/products", get(catalog::list_products))
        .route("/products/:id", get(catalog::get_product))
        .route("/cart/quote", post(catalog::quote_cart))
        .route("/customers/nickname-available", get(customers::nickname_available))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/me", get(auth::me))
        .route("/me/orders", get(auth::my_orders))
}

/// Public writes, limited per client IP.
fn limited_routes(state: &AppState) -> Router<AppState> {
    use handlers::{auth, orders, partnerships};

    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/staff/login", post(auth::staff_login))
        .route("/orders", post(orders::checkout))
        .route("/partnerships", post(partnerships::submit))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
}

/// Back office, staff only.
fn admin_routes(state: &AppState) -> Router<AppState> {
    use handlers::{catalog, customers, i18n, orders, partnerships, price_types, stats};

    Router::new()
        // products
        .route("/products", post(catalog::create_product))
        .route(
            "/products/:id",
            get(catalog::get_product_detail)
                .put(catalog::update_product)
                .delete(catalog::delete_product),
        )
        .route("/products/:id/prices", put(catalog::set_prices))
        // categories
        .route("/categories", post(catalog::create_category))
        .route(
            "/categories/:id",
            put(catalog::update_category).delete(catalog::delete_category),
        )
        // price types
        .route("/price-types", get(price_types::list).post(price_types::create))
        .route(
            "/price-types/:id",
            put(price_types::update).delete(price_types::delete),
        )
        .route("/price-types/:id/default", post(price_types::set_default))
        // customers
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customers/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        // orders
        .route("/orders", get(orders::list_orders))
        .route("/orders/:id", get(orders::get_order))
        .route("/orders/:id/status", put(orders::update_order_status))
        // translations
        .route("/translations", get(i18n::list_entries))
        .route("/translations/:locale/:key", put(i18n::upsert))
        .route("/translations/:locale/import", post(i18n::import))
        .route("/translations/keys/:key", delete(i18n::delete_key))
        // partnerships
        .route("/partnerships", get(partnerships::list))
        .route("/partnerships/:id/status", put(partnerships::update_status))
        .route("/stats", get(stats::dashboard))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_staff,
        ))
}
