//! # Translation entries
//!
//! UI strings are a key-value store per locale, fetched by the client at
//! runtime.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Translation {
    pub locale: String,
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Every string of one locale, keyed by translation key.
pub type TranslationBundle = BTreeMap<String, String>;

/// One key with its value in each locale, for the back office table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub key: String,
    pub uz: Option<String>,
    pub ru: Option<String>,
    pub tr: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertTranslationRequest {
    #[validate(length(min = 1, max = 5000, message = "Value must be 1-5000 characters"))]
    pub value: String,
}

/// Bulk import body: `{ "entries": { "cart.title": "Savat", ... } }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportTranslationsRequest {
    pub entries: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub locale: String,
    pub written: usize,
}
