//! # Catalog models
//!
//! Categories, price types (customer tiers), products and their per-tier
//! prices. Money is whole so'm stored as `i64`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{Locale, LocalizedText};

// =====================================
// Category
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: String,
    pub slug: String,
    pub name_uz: String,
    pub name_ru: String,
    pub name_tr: String,
    pub sort_order: i64,
}

impl Category {
    #[must_use]
    pub fn name(&self) -> LocalizedText {
        LocalizedText::new(&self.name_uz, &self.name_ru, &self.name_tr)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 2, max = 64, message = "Slug must be 2-64 characters"))]
    pub slug: String,

    #[validate(nested)]
    pub name: LocalizedText,

    #[serde(default)]
    pub sort_order: i64,
}

/// Category as shown to shoppers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub names: LocalizedText,
    pub sort_order: i64,
}

impl CategoryView {
    #[must_use]
    pub fn from_category(category: &Category, locale: Locale) -> Self {
        let names = category.name();
        Self {
            id: category.id.clone(),
            slug: category.slug.clone(),
            name: names.get(locale).to_string(),
            names,
            sort_order: category.sort_order,
        }
    }
}

// =====================================
// Price Type
// =====================================
/// A named customer tier (retail, wholesale, VIP) selecting which price a
/// product shows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PriceType {
    pub id: String,
    pub code: String,
    pub name: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePriceTypeRequest {
    #[validate(length(min = 2, max = 32, message = "Code must be 2-32 characters"))]
    pub code: String,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePriceTypeRequest {
    #[validate(length(min = 2, max = 32, message = "Code must be 2-32 characters"))]
    pub code: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
}

// =====================================
// Product
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub category_id: Option<String>,
    pub name_uz: String,
    pub name_ru: String,
    pub name_tr: String,
    pub description_uz: String,
    pub description_ru: String,
    pub description_tr: String,
    pub image_url: Option<String>,
    pub volume_ml: Option<i64>,
    pub units_per_box: i64,
    pub in_stock: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub fn name(&self) -> LocalizedText {
        LocalizedText::new(&self.name_uz, &self.name_ru, &self.name_tr)
    }

    #[must_use]
    pub fn description(&self) -> LocalizedText {
        LocalizedText::new(&self.description_uz, &self.description_ru, &self.description_tr)
    }

    /// Can be put into a cart at all (prices aside).
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        self.is_active && self.in_stock
    }
}

/// Price of one product for one price type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductPrice {
    pub product_id: String,
    pub price_type_id: String,
    pub unit_price: i64,
    /// Explicit bulk price; derived from `unit_price` when absent
    pub box_price: Option<i64>,
}

/// Whether a cart or order line counts single items or whole boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PurchaseUnit {
    #[default]
    Unit,
    Box,
}

/// Prices a shopper actually sees after tier resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPrice {
    pub unit_price: i64,
    pub box_price: i64,
}

impl ResolvedPrice {
    #[must_use]
    pub fn for_unit(&self, unit: PurchaseUnit) -> i64 {
        match unit {
            PurchaseUnit::Unit => self.unit_price,
            PurchaseUnit::Box => self.box_price,
        }
    }
}

// =====================================
// Product Requests
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PriceInput {
    #[validate(length(min = 1, message = "Price type is required"))]
    pub price_type_id: String,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub unit_price: i64,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub box_price: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: String,

    pub category_id: Option<String>,

    #[validate(nested)]
    pub name: LocalizedText,

    #[serde(default)]
    pub description: Option<LocalizedText>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    #[validate(range(min = 1, message = "Volume must be positive"))]
    pub volume_ml: Option<i64>,

    #[serde(default = "default_units_per_box")]
    #[validate(range(min = 1, max = 10000, message = "A box holds 1-10000 units"))]
    pub units_per_box: i64,

    #[serde(default = "default_true")]
    pub in_stock: bool,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub prices: Vec<PriceInput>,
}

fn default_units_per_box() -> i64 { 1 }
fn default_true() -> bool { true }

/// Partial update; absent fields keep their value. `category_id: ""`
/// detaches the product from its category.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: Option<String>,

    pub category_id: Option<String>,

    pub name: Option<LocalizedText>,

    pub description: Option<LocalizedText>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,

    #[validate(range(min = 1, message = "Volume must be positive"))]
    pub volume_ml: Option<i64>,

    #[validate(range(min = 1, max = 10000, message = "A box holds 1-10000 units"))]
    pub units_per_box: Option<i64>,

    pub in_stock: Option<bool>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPricesRequest {
    pub prices: Vec<PriceInput>,
}

/// Query string of the product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    #[serde(default)]
    pub include_inactive: bool,
}

// =====================================
// Product Responses
// =====================================
/// Product as a shopper sees it: one language, one price tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductView {
    pub id: String,
    pub sku: String,
    pub category_id: Option<String>,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub volume_ml: Option<i64>,
    pub units_per_box: i64,
    pub in_stock: bool,
    /// `None` when the product has no price for the shopper's tier or the
    /// default tier
    pub price: Option<ResolvedPrice>,
}

impl ProductView {
    #[must_use]
    pub fn new(product: &Product, locale: Locale, price: Option<ResolvedPrice>) -> Self {
        Self {
            id: product.id.clone(),
            sku: product.sku.clone(),
            category_id: product.category_id.clone(),
            name: product.name().get(locale).to_string(),
            description: product.description().get(locale).to_string(),
            image_url: product.image_url.clone(),
            volume_ml: product.volume_ml,
            units_per_box: product.units_per_box,
            in_stock: product.in_stock,
            price,
        }
    }
}

/// Product with every language and every tier price, for the back office.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub prices: Vec<ProductPrice>,
}
