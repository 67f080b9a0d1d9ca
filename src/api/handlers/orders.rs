//! # Order Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    api::extractors::{JsonBody, OptionalAuth, RequestLocale, ValidatedJson},
    error::Result,
    models::{
        ApiResponse, CheckoutRequest, Order, OrderDetail, OrderQuery, PaginatedResult,
        UpdateOrderStatusRequest,
    },
    services::AppState,
};

// =====================================
// Checkout
// =====================================
/// Place an order from a cart. Guests must send contact details; a
/// logged-in customer's profile fills in whatever is omitted and their
/// price tier applies.
///
/// # Endpoint
/// `POST /api/orders`
///
/// # Request Body
/// ```json
/// {
///   "cart": { "lines": [{ "product_id": "...", "quantity": 2, "unit": "box" }] },
///   "customer_name": "Ali Valiyev",
///   "phone": "+998901234567",
///   "address": "Toshkent, Chilonzor 5",
///   "latitude": 41.28,
///   "longitude": 69.2,
///   "note": "Call before delivery"
/// }
/// ```
pub async fn checkout(
    State(state): State<AppState>,
    auth: OptionalAuth,
    RequestLocale(locale): RequestLocale,
    ValidatedJson(request): ValidatedJson<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let order = state
        .order_service
        .checkout(request, auth.customer_id(), locale)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

// =====================================
// Back Office
// =====================================
/// # Endpoint
/// `GET /api/admin/orders?status=pending&page=1`
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<Order>>>> {
    let orders = state.order_service.list(&query).await?;

    Ok(Json(ApiResponse::success(orders)))
}

/// # Endpoint
/// `GET /api/admin/orders/:id`
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = state.order_service.get(&id).await?;

    Ok(Json(ApiResponse::success(order)))
}

/// Move an order along its workflow; invalid moves answer `409`.
///
/// # Endpoint
/// `PUT /api/admin/orders/:id/status`
///
/// # Request Body
/// ```json
/// { "status": "confirmed" }
/// ```
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = state.order_service.update_status(&id, request.status).await?;

    Ok(Json(ApiResponse::success(order)))
}
