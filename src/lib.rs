//! # Drinks Storefront
//!
//! Multilingual (Uzbek, Russian, Turkish) storefront and back office API
//! for a beverage distributor: catalog with tiered prices, client-held
//! carts, checkout, customers, translations and partnership applications.
//!
//! ## Layout
//!
//! ```text
//! src/
//! ├── lib.rs          # library root
//! ├── main.rs         # server binary
//! ├── config/         # settings from defaults and STORE_* variables
//! ├── error/          # AppError and its HTTP rendering
//! ├── database/       # SQLite pool, migrations, repositories
//! ├── models/         # domain types and request/response DTOs
//! ├── services/       # business rules, pricing, workflows
//! ├── api/            # router, handlers, extractors, middleware
//! └── utils/          # small text helpers
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use drinks_storefront::{api::create_router, config::Config, database::Database};
//!
//! #[tokio::main]
//! async fn main() -> drinks_storefront::Result<()> {
//!     let config = Config::from_env()?;
//!     let db = Database::connect(&config.database_url).await?;
//!     db.migrate().await?;
//!
//!     let app = create_router(db, config);
//!     # let _ = app;
//!     Ok(())
//! }
//! ```

// =====================================
// Module Declarations
// =====================================
pub mod config;

pub mod error;

pub mod database;

pub mod models;

pub mod services;

pub mod api;

pub mod utils;

// =====================================
// Re-exports
// =====================================
pub use error::Result;

pub use error::AppError;

// =====================================
// Prelude Module
// =====================================
/// Common imports for binaries and tests.
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::database::Database;
    pub use crate::error::{AppError, Result};
    pub use crate::models::*;
    pub use crate::services::*;
}
