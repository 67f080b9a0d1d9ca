//! # Partnership Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    api::extractors::ValidatedJson,
    error::Result,
    models::{
        ApiResponse, PaginatedResult, PartnershipApplication, PartnershipQuery, PartnershipRequest,
        UpdatePartnershipStatusRequest,
    },
    services::AppState,
};

/// Public application form.
///
/// # Endpoint
/// `POST /api/partnerships`
///
/// # Request Body
/// ```json
/// {
///   "company_name": "Samarqand Savdo",
///   "contact_name": "Dilshod",
///   "phone": "+998662334455",
///   "city": "Samarqand",
///   "message": "We run three shops"
/// }
/// ```
pub async fn submit(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PartnershipRequest>,
) -> Result<impl IntoResponse> {
    let application = state.partnership_service.submit(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::success(application)
                .with_message("Application received, we will contact you soon"),
        ),
    ))
}

/// # Endpoint
/// `GET /api/admin/partnerships?status=pending`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<PartnershipQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<PartnershipApplication>>>> {
    let applications = state.partnership_service.list(&query).await?;

    Ok(Json(ApiResponse::success(applications)))
}

/// # Endpoint
/// `PUT /api/admin/partnerships/:id/status`
///
/// # Request Body
/// ```json
/// { "status": "contacted", "staff_note": "Sent the price list" }
/// ```
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdatePartnershipStatusRequest>,
) -> Result<Json<ApiResponse<PartnershipApplication>>> {
    let application = state.partnership_service.update_status(&id, request).await?;

    Ok(Json(ApiResponse::success(application)))
}
