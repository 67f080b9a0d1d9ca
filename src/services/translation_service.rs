//! # Translation service
//!
//! UI strings per locale, with the default locale filling the gaps.

use std::collections::BTreeMap;

use tracing::{info, instrument};
use validator::Validate;

use super::Service;
use crate::{
    database::TranslationRepository,
    error::{AppError, Result},
    models::{
        ImportResult, ImportTranslationsRequest, Locale, Translation, TranslationBundle,
        TranslationEntry, UpsertTranslationRequest,
    },
    utils::is_valid_translation_key,
};

/// Longest value accepted for a single string.
const MAX_VALUE_LENGTH: usize = 5000;

#[derive(Debug, Clone)]
pub struct TranslationService {
    repo: TranslationRepository,
    default_locale: Locale,
}

impl Service for TranslationService {}

impl TranslationService {
    #[must_use]
    pub fn new(repo: TranslationRepository, default_locale: Locale) -> Self {
        Self {
            repo,
            default_locale,
        }
    }

    /// Every key with its value in `locale`; keys missing there take the
    /// default locale's value.
    pub async fn bundle(&self, locale: Locale) -> Result<TranslationBundle> {
        let mut bundle = self.repo.bundle(locale.code()).await?;

        if locale != self.default_locale {
            for (key, value) in self.repo.bundle(self.default_locale.code()).await? {
                bundle.entry(key).or_insert(value);
            }
        }

        Ok(bundle)
    }

    /// One row per key with the value in each locale.
    pub async fn list_entries(&self) -> Result<Vec<TranslationEntry>> {
        let rows = self.repo.find_all().await?;
        let mut entries: BTreeMap<String, TranslationEntry> = BTreeMap::new();

        for row in rows {
            let entry = entries.entry(row.key.clone()).or_insert_with(|| TranslationEntry {
                key: row.key.clone(),
                ..Default::default()
            });

            match row.locale.parse::<Locale>() {
                Ok(Locale::Uz) => entry.uz = Some(row.value),
                Ok(Locale::Ru) => entry.ru = Some(row.value),
                Ok(Locale::Tr) => entry.tr = Some(row.value),
                Err(_) => {}
            }
        }

        Ok(entries.into_values().collect())
    }

    #[instrument(skip(self, request))]
    pub async fn upsert(&self, locale: Locale, key: &str, request: UpsertTranslationRequest) -> Result<Translation> {
        request.validate()?;
        check_key(key)?;

        if request.value.trim().is_empty() {
            return Err(AppError::BadRequest("Value cannot be empty".to_string()));
        }

        self.repo.upsert(locale.code(), key, &request.value).await
    }

    /// Write many strings of one locale at once. Nothing is written when
    /// any key or value is invalid.
    #[instrument(skip(self, request), fields(entries = request.entries.len()))]
    pub async fn import(&self, locale: Locale, request: ImportTranslationsRequest) -> Result<ImportResult> {
        for (key, value) in &request.entries {
            check_key(key)?;
            if value.trim().is_empty() || value.chars().count() > MAX_VALUE_LENGTH {
                return Err(AppError::BadRequest(format!(
                    "Value of '{key}' must be 1-{MAX_VALUE_LENGTH} characters"
                )));
            }
        }

        let written = self.repo.import(locale.code(), &request.entries).await?;
        info!(locale = %locale, written, "Translations imported");

        Ok(ImportResult {
            locale: locale.code().to_string(),
            written,
        })
    }

    /// Remove a key from every locale.
    #[instrument(skip(self))]
    pub async fn delete_key(&self, key: &str) -> Result<()> {
        if self.repo.delete_key(key).await? == 0 {
            return Err(AppError::NotFound(format!("Translation key '{key}' not found")));
        }
        Ok(())
    }
}

fn check_key(key: &str) -> Result<()> {
    if is_valid_translation_key(key) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid translation key '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use pretty_assertions::assert_eq;

    async fn service() -> TranslationService {
        let db = Database::in_memory().await.unwrap();
        TranslationService::new(TranslationRepository::new(db), Locale::Uz)
    }

    fn value(v: &str) -> UpsertTranslationRequest {
        UpsertTranslationRequest { value: v.to_string() }
    }

    #[tokio::test]
    async fn bundle_falls_back_to_default_locale() {
        let service = service().await;
        service.upsert(Locale::Uz, "cart.title", value("Savat")).await.unwrap();
        service.upsert(Locale::Uz, "cart.empty", value("Savat bo'sh")).await.unwrap();
        service.upsert(Locale::Ru, "cart.title", value("Корзина")).await.unwrap();

        let ru = service.bundle(Locale::Ru).await.unwrap();
        assert_eq!(ru["cart.title"], "Корзина");
        assert_eq!(ru["cart.empty"], "Savat bo'sh");

        let tr = service.bundle(Locale::Tr).await.unwrap();
        assert_eq!(tr["cart.title"], "Savat");
    }

    #[tokio::test]
    async fn entries_group_locales_by_key() {
        let service = service().await;
        service.upsert(Locale::Uz, "nav.home", value("Bosh sahifa")).await.unwrap();
        service.upsert(Locale::Tr, "nav.home", value("Ana sayfa")).await.unwrap();

        let entries = service.list_entries().await.unwrap();
        assert_eq!(
            entries,
            vec![TranslationEntry {
                key: "nav.home".to_string(),
                uz: Some("Bosh sahifa".to_string()),
                ru: None,
                tr: Some("Ana sayfa".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn import_is_all_or_nothing() {
        let service = service().await;
        let entries: BTreeMap<String, String> = [
            ("footer.phone".to_string(), "Telefon".to_string()),
            ("Bad Key".to_string(), "x".to_string()),
        ]
        .into_iter()
        .collect();

        let err = service
            .import(Locale::Uz, ImportTranslationsRequest { entries })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(service.bundle(Locale::Uz).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_missing_key_is_not_found() {
        let service = service().await;
        service.upsert(Locale::Ru, "nav.about", value("О нас")).await.unwrap();

        service.delete_key("nav.about").await.unwrap();
        let err = service.delete_key("nav.about").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
