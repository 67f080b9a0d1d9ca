//! # Customer model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

// =====================================
// Customer Entity
// =====================================
/// A shop customer. `password_hash` is only set for customers who
/// registered themselves; staff-created customers cannot log in until one
/// is set.
#[derive(Debug, Clone, FromRow)]
pub struct Customer {
    pub id: String,
    /// Lowercase, unique
    pub nickname: String,
    pub full_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_type_id: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload built by the service.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub id: String,
    pub nickname: String,
    pub full_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_type_id: Option<String>,
    pub password_hash: Option<String>,
}

// =====================================
// Requests
// =====================================
/// Customer created by staff in the back office.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 3, max = 32, message = "Nickname must be 3-32 characters"))]
    pub nickname: String,

    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub full_name: String,

    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: String,

    #[validate(length(max = 300, message = "Address is too long"))]
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub longitude: Option<f64>,

    pub price_type_id: Option<String>,
}

/// Partial update by staff. `price_type_id: ""` clears the tier so the
/// customer sees default prices.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 3, max = 32, message = "Nickname must be 3-32 characters"))]
    pub nickname: Option<String>,

    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub full_name: Option<String>,

    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 300, message = "Address is too long"))]
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude out of range"))]
    pub latitude: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0, message = "Longitude out of range"))]
    pub longitude: Option<f64>,

    /// Drop the stored coordinates; cannot be combined with new ones.
    #[serde(default)]
    pub clear_location: bool,

    pub price_type_id: Option<String>,

    pub is_active: Option<bool>,
}

/// Self-registration from the storefront.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterCustomerRequest {
    #[validate(length(min = 3, max = 32, message = "Nickname must be 3-32 characters"))]
    pub nickname: String,

    #[validate(length(min = 2, max = 120, message = "Name must be 2-120 characters"))]
    pub full_name: String,

    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(max = 300, message = "Address is too long"))]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NicknameQuery {
    pub nickname: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// =====================================
// Responses
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: String,
    pub nickname: String,
    pub full_name: String,
    pub phone: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price_type_id: Option<String>,
    pub can_login: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// The password hash never leaves the service.
impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            can_login: customer.password_hash.is_some(),
            id: customer.id,
            nickname: customer.nickname,
            full_name: customer.full_name,
            phone: customer.phone,
            address: customer.address,
            latitude: customer.latitude,
            longitude: customer.longitude,
            price_type_id: customer.price_type_id,
            is_active: customer.is_active,
            created_at: customer.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NicknameAvailability {
    pub nickname: String,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
