// src/handlers/dashboard.rs

use axum::{extract::State, Json};

use crate::{
    common::error::{AppError, ErrorBody},
    config::AppState,
    middleware::rbac::{CapViewDashboard, RequireCapability},
    models::dashboard::DashboardMetrics,
};

// GET /api/dashboard/metrics
#[utoipa::path(
    get,
    path = "/api/dashboard/metrics",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Headline sales metrics for the current month", body = DashboardMetrics),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 500, description = "A metrics query failed", body = ErrorBody)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_metrics(
    State(app_state): State<AppState>,
    _: RequireCapability<CapViewDashboard>,
) -> Result<Json<DashboardMetrics>, AppError> {
    let metrics = app_state.dashboard_service.get_metrics(&app_state.db_pool).await?;
    Ok(Json(metrics))
}
