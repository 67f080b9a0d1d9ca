//! # Utilities
//!
//! Format checks for user-chosen identifiers, phone normalisation and
//! order number generation.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

// =====================================
// Constants
// =====================================
pub const MIN_NICKNAME_LENGTH: usize = 3;
pub const MAX_NICKNAME_LENGTH: usize = 32;
pub const MAX_TRANSLATION_KEY_LENGTH: usize = 128;
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

// =====================================
// Lazy Statics (Regex patterns)
// =====================================
pub static VALID_NICKNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_.]+$").expect("Invalid regex pattern"));

/// Category slugs
pub static VALID_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("Invalid regex pattern"));

/// Price type codes
pub static VALID_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_-]+$").expect("Invalid regex pattern"));

pub static VALID_SKU: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("Invalid regex pattern"));

pub static VALID_TRANSLATION_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_.-]*$").expect("Invalid regex pattern"));

// =====================================
// Validation Functions
// =====================================
/// Lowercased, trimmed nickname as stored.
#[must_use]
pub fn normalize_nickname(nickname: &str) -> String {
    nickname.trim().to_lowercase()
}

/// Why a (normalised) nickname is not acceptable, if it is not.
///
/// # Example
/// ```rust
/// use drinks_storefront::utils::nickname_problem;
///
/// assert_eq!(nickname_problem("ali_99"), None);
/// assert!(nickname_problem("a").is_some());
/// assert!(nickname_problem("ali veli").is_some());
/// ```
#[must_use]
pub fn nickname_problem(nickname: &str) -> Option<&'static str> {
    let len = nickname.chars().count();
    if !(MIN_NICKNAME_LENGTH..=MAX_NICKNAME_LENGTH).contains(&len) {
        return Some("Nickname must be 3-32 characters");
    }

    if !VALID_NICKNAME.is_match(nickname) {
        return Some("Nickname may only contain a-z, 0-9, '_' and '.'");
    }

    None
}

#[must_use]
pub fn is_valid_translation_key(key: &str) -> bool {
    key.len() <= MAX_TRANSLATION_KEY_LENGTH && VALID_TRANSLATION_KEY.is_match(key)
}

/// Only http(s) URLs are accepted for images.
#[must_use]
pub fn is_valid_url(url_str: &str) -> bool {
    match url::Url::parse(url_str) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Keep a leading `+` and the digits; drop spaces, dashes and brackets.
///
/// # Example
/// ```rust
/// use drinks_storefront::utils::normalize_phone;
///
/// assert_eq!(normalize_phone("+998 (90) 123-45-67"), "+998901234567");
/// ```
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();

    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

/// Trimmed value, or `None` when blank.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =====================================
// Order Numbers
// =====================================
/// Suffixes drawn uniformly from every six-character base62 string.
const ORDER_SUFFIX_SPACE: u64 = 62u64.pow(6);

/// Order number: creation date plus six case-sensitive base62
/// characters, e.g. `261019-4fZk2Q`.
#[must_use]
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let random: u64 = rand::thread_rng().gen_range(0..ORDER_SUFFIX_SPACE);
    let suffix = base62::encode(random);

    format!("{}-{suffix:0>6}", now.format("%y%m%d"))
}

/// Hide all but the first characters, for logs.
///
/// # Example
/// ```rust
/// use drinks_storefront::utils::mask_string;
///
/// assert_eq!(mask_string("+998901234567", 4), "+998***");
/// ```
#[must_use]
pub fn mask_string(text: &str, visible_chars: usize) -> String {
    if text.chars().count() <= visible_chars {
        return "*".repeat(text.chars().count());
    }

    let visible: String = text.chars().take(visible_chars).collect();
    format!("{visible}***")
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nickname_rules() {
        assert_eq!(nickname_problem("ali.valiyev"), None);
        assert_eq!(nickname_problem("shop_42"), None);
        assert!(nickname_problem("ab").is_some());
        assert!(nickname_problem("Ali").is_some()); // must be normalised first
        assert!(nickname_problem("ali-v").is_some());
        assert!(nickname_problem(&"x".repeat(33)).is_some());
        assert_eq!(normalize_nickname("  Ali_V "), "ali_v");
    }

    #[test]
    fn test_slug_code_and_sku() {
        assert!(VALID_SLUG.is_match("soft-drinks"));
        assert!(!VALID_SLUG.is_match("soft--drinks"));
        assert!(!VALID_SLUG.is_match("Soft"));
        assert!(VALID_CODE.is_match("vip"));
        assert!(VALID_SKU.is_match("COLA-0.5L"));
        assert!(!VALID_SKU.is_match("cola 05"));
    }

    #[test]
    fn test_translation_keys() {
        assert!(is_valid_translation_key("cart.title"));
        assert!(is_valid_translation_key("checkout.submit_button"));
        assert!(!is_valid_translation_key(".hidden"));
        assert!(!is_valid_translation_key("Cart.Title"));
        assert!(!is_valid_translation_key(&"k".repeat(129)));
    }

    #[test]
    fn test_valid_url() {
        assert!(is_valid_url("https://cdn.example.com/cola.png"));
        assert!(!is_valid_url("ftp://example.com/cola.png"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn test_phone_normalization() {
        assert_eq!(normalize_phone("+998 90 123 45 67"), "+998901234567");
        assert_eq!(normalize_phone("90-123-45-67"), "901234567");
    }

    #[test]
    fn test_order_number_shape() {
        let now = Utc::now();
        let number = generate_order_number(now);
        let (date, suffix) = number.split_once('-').unwrap();

        assert_eq!(date, now.format("%y%m%d").to_string());
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_order_suffix_keeps_both_cases() {
        let suffixes: String = (0..200)
            .map(|_| generate_order_number(Utc::now()))
            .map(|number| number[7..].to_string())
            .collect();

        assert!(suffixes.chars().any(|c| c.is_ascii_lowercase()));
        assert!(suffixes.chars().any(|c| c.is_ascii_uppercase()));
        assert!(suffixes.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(Some(" x ".into())), Some("x".into()));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_mask_string() {
        assert_eq!(mask_string("secret123", 3), "sec***");
        assert_eq!(mask_string("ab", 5), "**");
    }
}
