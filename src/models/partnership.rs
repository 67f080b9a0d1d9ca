//! # Partnership applications
//!
//! Lead-generation form submissions from prospective resellers, reviewed by
//! staff.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Review workflow.
///
/// ```text
/// pending -> contacted -> approved
///    |           |
///    +-----------+-----> rejected
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PartnershipStatus {
    Pending,
    Contacted,
    Approved,
    Rejected,
}

impl PartnershipStatus {
    #[must_use]
    pub fn can_transition_to(self, next: PartnershipStatus) -> bool {
        use PartnershipStatus::{Approved, Contacted, Pending, Rejected};

        matches!(
            (self, next),
            (Pending, Contacted) | (Pending, Rejected) | (Contacted, Approved) | (Contacted, Rejected)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PartnershipApplication {
    pub id: String,
    pub company_name: String,
    pub contact_name: String,
    pub phone: String,
    pub city: Option<String>,
    pub message: Option<String>,
    pub status: PartnershipStatus,
    pub staff_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PartnershipRequest {
    #[validate(length(min = 2, max = 150, message = "Company name must be 2-150 characters"))]
    pub company_name: String,

    #[validate(length(min = 2, max = 120, message = "Contact name must be 2-120 characters"))]
    pub contact_name: String,

    #[validate(length(min = 7, max = 20, message = "Phone must be 7-20 characters"))]
    pub phone: String,

    #[validate(length(max = 100, message = "City is too long"))]
    pub city: Option<String>,

    #[validate(length(max = 2000, message = "Message is too long"))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePartnershipStatusRequest {
    pub status: PartnershipStatus,

    #[validate(length(max = 1000, message = "Note is too long"))]
    pub staff_note: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnershipQuery {
    pub status: Option<PartnershipStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
