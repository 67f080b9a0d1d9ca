//! # Order models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::PurchaseUnit;

// =====================================
// Order Status
// =====================================
/// Lifecycle of an order.
///
/// ```text
/// pending -> confirmed -> delivering -> delivered
///    |           |
///    +-----------+--> cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Delivering,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Delivering,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivering => "delivering",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::{Cancelled, Confirmed, Delivered, Delivering, Pending};

        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Delivering)
                | (Confirmed, Cancelled)
                | (Delivering, Delivered)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

// =====================================
// Entities
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: String,
    /// Human-readable, e.g. `261019-4FZK2Q`
    pub order_number: String,
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub phone: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub note: Option<String>,
    pub price_type_id: String,
    pub status: OrderStatus,
    pub subtotal: i64,
    pub total_quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Line of an order; name and prices are copied at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub unit: PurchaseUnit,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_total: i64,
    pub position: i64,
}

/// Order with its lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =====================================
// Requests
// =====================================
/// Checkout request. Contact fields may be omitted by a logged-in customer,
/// in which case the profile values are used.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub cart: super::Cart,

    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub customer_name: Option<String>,

    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: Option<String>,

    #[validate(length(min = 3, max = 300, message = "Address must be 3-300 characters"))]
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub longitude: Option<f64>,

    #[validate(length(max = 500, message = "Note is too long"))]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
