//! # Customer Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    api::extractors::{AdminUser, JsonBody},
    error::Result,
    models::{
        ApiResponse, CreateCustomerRequest, CustomerQuery, CustomerResponse, NicknameAvailability,
        NicknameQuery, PaginatedResult, UpdateCustomerRequest,
    },
    services::AppState,
};

// =====================================
// Nickname Availability
// =====================================
/// Checked live by the registration form.
///
/// # Endpoint
/// `GET /api/customers/nickname-available?nickname=ali`
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": { "nickname": "ali", "available": false, "reason": "Nickname is already taken" }
/// }
/// ```
pub async fn nickname_available(
    State(state): State<AppState>,
    Query(query): Query<NicknameQuery>,
) -> Result<Json<ApiResponse<NicknameAvailability>>> {
    let availability = state
        .customer_service
        .nickname_available(&query.nickname)
        .await?;

    Ok(Json(ApiResponse::success(availability)))
}

// =====================================
// Back Office
// =====================================
/// # Endpoint
/// `GET /api/admin/customers?q=ali&page=1`
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<CustomerResponse>>>> {
    let customers = state.customer_service.list(&query).await?;

    Ok(Json(ApiResponse::success(customers)))
}

/// Customers created here have no password and cannot log in.
///
/// # Endpoint
/// `POST /api/admin/customers`
pub async fn create_customer(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateCustomerRequest>,
) -> Result<impl IntoResponse> {
    let customer = state.customer_service.create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CustomerResponse::from(customer))),
    ))
}

/// # Endpoint
/// `GET /api/admin/customers/:id`
pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CustomerResponse>>> {
    let customer = state.customer_service.get(&id).await?;

    Ok(Json(ApiResponse::success(customer.into())))
}

/// Partial update. An empty `price_type_id` detaches the customer from
/// their tier.
///
/// # Endpoint
/// `PUT /api/admin/customers/:id`
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateCustomerRequest>,
) -> Result<Json<ApiResponse<CustomerResponse>>> {
    let customer = state.customer_service.update(&id, request).await?;

    Ok(Json(ApiResponse::success(customer.into())))
}

/// Admin only. Past orders are kept without the customer link.
///
/// # Endpoint
/// `DELETE /api/admin/customers/:id`
pub async fn delete_customer(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.customer_service.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
