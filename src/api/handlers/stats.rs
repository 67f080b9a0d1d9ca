//! # Stats Handler

use axum::{extract::State, Json};

use crate::{
    error::Result,
    models::{ApiResponse, DashboardStats},
    services::AppState,
};

// =====================================
// Dashboard
// =====================================
/// # Endpoint
/// `GET /api/admin/stats`
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<ApiResponse<DashboardStats>>> {
    let stats = state.stats_service.dashboard().await?;

    Ok(Json(ApiResponse::success(stats)))
}
