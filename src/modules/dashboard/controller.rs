use axum::{Json, extract::State};
use tracing::instrument;

use campusdesk_core::AppError;

use crate::middleware::auth::RequireViewDashboard;
use crate::modules::auth::controller::ErrorResponse;
use crate::state::AppState;

use super::model::Dashboard;
use super::service::DashboardService;

/// Counts for the caller's landing page, shaped by role
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Dashboard; `role` tells which shape", body = Dashboard),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    RequireViewDashboard(caller): RequireViewDashboard,
) -> Result<Json<Dashboard>, AppError> {
    let dashboard = DashboardService::get_dashboard(&state.db, &caller).await?;
    Ok(Json(dashboard))
}
