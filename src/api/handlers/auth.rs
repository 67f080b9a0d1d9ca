//! # Auth Handlers
//!
//! Customer registration and login, staff login, token refresh and the
//! caller's own profile.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    api::extractors::{AuthUser, BearerToken, CustomerUser, ValidatedJson},
    error::Result,
    models::{
        ApiResponse, CustomerLoginRequest, LoginResponse, Order, Profile, RegisterCustomerRequest,
        StaffLoginRequest,
    },
    services::AppState,
};

// =====================================
// Register
// =====================================
/// Create a customer account and log it in.
///
/// # Endpoint
/// `POST /api/auth/register`
///
/// # Request Body
/// ```json
/// {
///   "nickname": "ali",
///   "full_name": "Ali Valiyev",
///   "phone": "+998901234567",
///   "password": "secret-pass",
///   "address": "Toshkent, Chilonzor 5"
/// }
/// ```
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterCustomerRequest>,
) -> Result<impl IntoResponse> {
    let response = state.auth_service.register(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

// =====================================
// Login
// =====================================
/// Customer login by nickname.
///
/// # Endpoint
/// `POST /api/auth/login`
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "profile": { "kind": "customer", "nickname": "ali", ... },
///     "token": "eyJ...",
///     "expires_at": "2026-..."
///   }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CustomerLoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let response = state.auth_service.customer_login(request).await?;

    Ok(Json(ApiResponse::success(response)))
}

/// Back office login by email.
///
/// # Endpoint
/// `POST /api/auth/staff/login`
pub async fn staff_login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<StaffLoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let response = state.auth_service.staff_login(request).await?;

    Ok(Json(ApiResponse::success(response)))
}

// =====================================
// Refresh Token
// =====================================
/// # Endpoint
/// `POST /api/auth/refresh`
///
/// # Headers
/// `Authorization: Bearer <token>`
pub async fn refresh_token(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let response = state.auth_service.refresh(&token).await?;

    Ok(Json(ApiResponse::success(response)))
}

// =====================================
// Current User
// =====================================
/// # Endpoint
/// `GET /api/me`
pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Profile>>> {
    let profile = state.auth_service.profile(&claims).await?;

    Ok(Json(ApiResponse::success(profile)))
}

/// Order history of the logged-in customer, newest first.
///
/// # Endpoint
/// `GET /api/me/orders`
pub async fn my_orders(
    State(state): State<AppState>,
    CustomerUser(claims): CustomerUser,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let orders = state.order_service.for_customer(&claims.sub).await?;

    Ok(Json(ApiResponse::success(orders)))
}
