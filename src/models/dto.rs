//! # Shared response DTOs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =====================================
// Generic API Responses
// =====================================
/// Success envelope: `{ "success": true, "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

// =====================================
// Health Check
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: bool,
}

impl HealthResponse {
    #[must_use]
    pub fn from_database(database_ok: bool) -> Self {
        Self {
            status: if database_ok { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database_ok,
        }
    }
}

// =====================================
// Statistics
// =====================================
/// Back office dashboard numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_products: i64,
    pub active_products: i64,
    pub active_customers: i64,
    /// Order count per status; every status is present
    pub orders_by_status: BTreeMap<String, i64>,
    /// Sum of delivered order subtotals
    pub delivered_revenue: i64,
    pub pending_partnerships: i64,
}
