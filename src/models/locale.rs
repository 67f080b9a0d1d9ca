//! # Locales
//!
//! The storefront speaks Uzbek, Russian and Turkish. Uzbek is the base
//! language: every localized field has an Uzbek value, the others may be
//! empty and then fall back to it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Supported interface and content language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Uz,
    Ru,
    Tr,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Uz, Locale::Ru, Locale::Tr];

    /// Two-letter code as used in URLs and the database.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Uz => "uz",
            Self::Ru => "ru",
            Self::Tr => "tr",
        }
    }

    /// Parse a language tag such as `ru`, `RU` or `ru-RU`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        match primary.as_str() {
            "uz" => Some(Self::Uz),
            "ru" => Some(Self::Ru),
            "tr" => Some(Self::Tr),
            _ => None,
        }
    }

    /// First supported language of an `Accept-Language` header, honouring
    /// quality weights (`ru-RU,ru;q=0.9,en;q=0.8`).
    #[must_use]
    pub fn from_accept_language(header: &str) -> Option<Self> {
        let mut candidates: Vec<(f32, Locale)> = header
            .split(',')
            .filter_map(|part| {
                let mut pieces = part.split(';');
                let locale = Self::from_tag(pieces.next()?)?;
                let quality = pieces
                    .find_map(|p| p.trim().strip_prefix("q="))
                    .and_then(|q| q.parse::<f32>().ok())
                    .unwrap_or(1.0);
                Some((quality, locale))
            })
            .collect();

        // stable sort keeps header order for equal weights
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
        candidates.first().map(|(_, locale)| *locale)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uz" => Ok(Self::Uz),
            "ru" => Ok(Self::Ru),
            "tr" => Ok(Self::Tr),
            other => Err(AppError::BadRequest(format!("Unsupported locale '{other}'"))),
        }
    }
}

// =====================================
// Localized Text
// =====================================
/// A text value in every supported language.
///
/// The length rules apply to names; descriptions are checked separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct LocalizedText {
    #[validate(length(min = 1, max = 200, message = "Uzbek name must be 1-200 characters"))]
    pub uz: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "Name is too long"))]
    pub ru: String,
    #[serde(default)]
    #[validate(length(max = 200, message = "Name is too long"))]
    pub tr: String,
}

impl LocalizedText {
    #[must_use]
    pub fn new(uz: impl Into<String>, ru: impl Into<String>, tr: impl Into<String>) -> Self {
        Self {
            uz: uz.into(),
            ru: ru.into(),
            tr: tr.into(),
        }
    }

    /// Value for `locale`, or the Uzbek value when that one is blank.
    #[must_use]
    pub fn get(&self, locale: Locale) -> &str {
        let value = match locale {
            Locale::Uz => &self.uz,
            Locale::Ru => &self.ru,
            Locale::Tr => &self.tr,
        };

        if value.trim().is_empty() {
            &self.uz
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tags() {
        assert_eq!(Locale::from_tag("RU"), Some(Locale::Ru));
        assert_eq!(Locale::from_tag("tr-TR"), Some(Locale::Tr));
        assert_eq!(Locale::from_tag("uz_Latn"), Some(Locale::Uz));
        assert_eq!(Locale::from_tag("en"), None);
        assert!("de".parse::<Locale>().is_err());
    }

    #[test]
    fn accept_language_respects_weights() {
        assert_eq!(
            Locale::from_accept_language("en-US,ru;q=0.5,tr;q=0.8"),
            Some(Locale::Tr)
        );
        assert_eq!(
            Locale::from_accept_language("ru-RU,ru;q=0.9,en;q=0.8"),
            Some(Locale::Ru)
        );
        assert_eq!(Locale::from_accept_language("en,de"), None);
    }

    #[test]
    fn localized_text_falls_back_to_uzbek() {
        let text = LocalizedText::new("Suv", "Вода", "");
        assert_eq!(text.get(Locale::Ru), "Вода");
        assert_eq!(text.get(Locale::Tr), "Suv");
    }
}
