//! # Health Check Handler

use axum::{extract::State, http::StatusCode, Json};
use tracing::warn;

use crate::{models::HealthResponse, services::AppState};

// =====================================
// Health Check
// =====================================
/// Liveness plus a real database round trip.
///
/// # Endpoint
/// `GET /health`
///
/// # Response
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": true
/// }
/// ```
///
/// A failed database check answers `503` with `"status": "degraded"`.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let db_ok = match state.db.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(HealthResponse::from_database(db_ok)))
}
