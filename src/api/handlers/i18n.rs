//! # Translation Handlers
//!
//! The storefront downloads one bundle per locale; the back office edits
//! keys across all locales.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::extractors::{JsonBody, ValidatedJson},
    error::Result,
    models::{
        ApiResponse, ImportResult, ImportTranslationsRequest, Locale, Translation, TranslationEntry,
        UpsertTranslationRequest,
    },
    services::AppState,
};

/// Every UI string for `locale`; keys missing in it carry the default
/// locale's value.
///
/// # Endpoint
/// `GET /api/i18n/:locale`
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": { "cart.title": "Корзина", "cart.empty": "Savat bo'sh" }
/// }
/// ```
pub async fn bundle(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Result<Json<ApiResponse<BTreeMap<String, String>>>> {
    let locale: Locale = locale.parse()?;
    let bundle = state.translation_service.bundle(locale).await?;

    Ok(Json(ApiResponse::success(bundle)))
}

// =====================================
// Back Office
// =====================================
/// # Endpoint
/// `GET /api/admin/translations`
pub async fn list_entries(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TranslationEntry>>>> {
    let entries = state.translation_service.list_entries().await?;

    Ok(Json(ApiResponse::success(entries)))
}

/// # Endpoint
/// `PUT /api/admin/translations/:locale/:key`
///
/// # Request Body
/// ```json
/// { "value": "Savat" }
/// ```
pub async fn upsert(
    State(state): State<AppState>,
    Path((locale, key)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<UpsertTranslationRequest>,
) -> Result<Json<ApiResponse<Translation>>> {
    let locale: Locale = locale.parse()?;
    let translation = state.translation_service.upsert(locale, &key, request).await?;

    Ok(Json(ApiResponse::success(translation)))
}

/// All-or-nothing bulk write for one locale.
///
/// # Endpoint
/// `POST /api/admin/translations/:locale/import`
pub async fn import(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    JsonBody(request): JsonBody<ImportTranslationsRequest>,
) -> Result<Json<ApiResponse<ImportResult>>> {
    let locale: Locale = locale.parse()?;
    let result = state.translation_service.import(locale, request).await?;

    Ok(Json(ApiResponse::success(result)))
}

/// Remove a key from every locale.
///
/// # Endpoint
/// `DELETE /api/admin/translations/keys/:key`
pub async fn delete_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode> {
    state.translation_service.delete_key(&key).await?;

    Ok(StatusCode::NO_CONTENT)
}
