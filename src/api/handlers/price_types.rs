//! # Price Type Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    api::extractors::{AdminUser, ValidatedJson},
    error::Result,
    models::{ApiResponse, CreatePriceTypeRequest, PriceType, UpdatePriceTypeRequest},
    services::AppState,
};

/// Default type first.
///
/// # Endpoint
/// `GET /api/admin/price-types`
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<PriceType>>>> {
    let price_types = state.price_type_service.list().await?;

    Ok(Json(ApiResponse::success(price_types)))
}

/// The first type ever created becomes the default.
///
/// # Endpoint
/// `POST /api/admin/price-types`
///
/// # Request Body
/// ```json
/// { "code": "wholesale", "name": "Ulgurji", "is_default": false }
/// ```
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreatePriceTypeRequest>,
) -> Result<impl IntoResponse> {
    let price_type = state.price_type_service.create(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(price_type))))
}

/// # Endpoint
/// `PUT /api/admin/price-types/:id`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdatePriceTypeRequest>,
) -> Result<Json<ApiResponse<PriceType>>> {
    let price_type = state.price_type_service.update(&id, request).await?;

    Ok(Json(ApiResponse::success(price_type)))
}

/// # Endpoint
/// `POST /api/admin/price-types/:id/default`
pub async fn set_default(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PriceType>>> {
    let price_type = state.price_type_service.set_default(&id).await?;

    Ok(Json(ApiResponse::success(price_type)))
}

/// Admin only. The default type and types still assigned to customers
/// cannot be deleted.
///
/// # Endpoint
/// `DELETE /api/admin/price-types/:id`
pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.price_type_service.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
