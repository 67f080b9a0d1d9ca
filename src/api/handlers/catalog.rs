//! # Catalog Handlers
//!
//! Storefront browsing and cart pricing, plus the back office product and
//! category editors. Shopper views are localized with [`RequestLocale`]
//! and priced for the caller's tier.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    api::extractors::{JsonBody, OptionalAuth, RequestLocale},
    error::Result,
    models::{
        ApiResponse, Cart, CartQuote, Category, CategoryRequest, CategoryView, CreateProductRequest,
        PaginatedResult, ProductDetail, ProductPrice, ProductQuery, ProductView, SetPricesRequest,
        UpdateProductRequest,
    },
    services::AppState,
};

// =====================================
// Storefront
// =====================================
/// # Endpoint
/// `GET /api/categories?lang=ru`
pub async fn list_categories(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
) -> Result<Json<ApiResponse<Vec<CategoryView>>>> {
    let categories = state.catalog_service.list_categories(locale).await?;

    Ok(Json(ApiResponse::success(categories)))
}

/// Active products, filtered by category and a search term, priced for the
/// caller's tier. Staff may pass `include_inactive=true`.
///
/// # Endpoint
/// `GET /api/products?category=<id>&q=cola&page=1&per_page=20`
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "data": {
///     "data": [
///       {
///         "id": "...",
///         "name": "Coca-Cola 0.5",
///         "units_per_box": 12,
///         "price": { "unit_price": 6000, "box_price": 70000 }
///       }
///     ],
///     "pagination": { "current_page": 1, "per_page": 20, "total_items": 1, ... }
///   }
/// }
/// ```
pub async fn list_products(
    State(state): State<AppState>,
    auth: OptionalAuth,
    RequestLocale(locale): RequestLocale,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<PaginatedResult<ProductView>>>> {
    let tier = state.pricing_tier(auth.claims()).await?;
    let include_inactive = query.include_inactive && auth.is_staff();

    let products = state
        .catalog_service
        .list_products(&query, locale, tier.as_ref(), include_inactive)
        .await?;

    Ok(Json(ApiResponse::success(products)))
}

/// # Endpoint
/// `GET /api/products/:id`
pub async fn get_product(
    State(state): State<AppState>,
    auth: OptionalAuth,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductView>>> {
    let tier = state.pricing_tier(auth.claims()).await?;

    let product = state
        .catalog_service
        .get_product(&id, locale, tier.as_ref(), auth.is_staff())
        .await?;

    Ok(Json(ApiResponse::success(product)))
}

/// Price a client-held cart. Duplicate lines are merged and zero-quantity
/// lines dropped before pricing.
///
/// # Endpoint
/// `POST /api/cart/quote`
///
/// # Request Body
/// ```json
/// {
///   "lines": [
///     { "product_id": "...", "quantity": 2, "unit": "box" },
///     { "product_id": "...", "quantity": 5 }
///   ]
/// }
/// ```
pub async fn quote_cart(
    State(state): State<AppState>,
    auth: OptionalAuth,
    RequestLocale(locale): RequestLocale,
    JsonBody(cart): JsonBody<Cart>,
) -> Result<Json<ApiResponse<CartQuote>>> {
    let tier = state.pricing_tier(auth.claims()).await?;
    let quote = state.catalog_service.quote(&cart, tier.as_ref(), locale).await?;

    Ok(Json(ApiResponse::success(quote)))
}

// =====================================
// Back Office: Products
// =====================================
/// # Endpoint
/// `POST /api/admin/products`
///
/// # Request Body
/// ```json
/// {
///   "sku": "COLA-05",
///   "category_id": "...",
///   "name": { "uz": "Koka-Kola 0.5", "ru": "Кока-Кола 0.5", "tr": "" },
///   "units_per_box": 12,
///   "prices": [{ "price_type_id": "...", "unit_price": 6000 }]
/// }
/// ```
pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    let product = state.catalog_service.create_product(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// Every language and every tier price.
///
/// # Endpoint
/// `GET /api/admin/products/:id`
pub async fn get_product_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let product = state.catalog_service.get_product_detail(&id).await?;

    Ok(Json(ApiResponse::success(product)))
}

/// Partial update; absent fields are kept.
///
/// # Endpoint
/// `PUT /api/admin/products/:id`
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let product = state.catalog_service.update_product(&id, request).await?;

    Ok(Json(ApiResponse::success(product)))
}

/// # Endpoint
/// `DELETE /api/admin/products/:id`
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.catalog_service.delete_product(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Replace the full price list of a product.
///
/// # Endpoint
/// `PUT /api/admin/products/:id/prices`
pub async fn set_prices(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<SetPricesRequest>,
) -> Result<Json<ApiResponse<Vec<ProductPrice>>>> {
    let prices = state.catalog_service.set_prices(&id, &request.prices).await?;

    Ok(Json(ApiResponse::success(prices)))
}

// =====================================
// Back Office: Categories
// =====================================
/// # Endpoint
/// `POST /api/admin/categories`
pub async fn create_category(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> Result<impl IntoResponse> {
    let category = state.catalog_service.create_category(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(category))))
}

/// # Endpoint
/// `PUT /api/admin/categories/:id`
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<CategoryRequest>,
) -> Result<Json<ApiResponse<Category>>> {
    let category = state.catalog_service.update_category(&id, request).await?;

    Ok(Json(ApiResponse::success(category)))
}

/// Products of the category stay, without a category.
///
/// # Endpoint
/// `DELETE /api/admin/categories/:id`
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.catalog_service.delete_category(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
