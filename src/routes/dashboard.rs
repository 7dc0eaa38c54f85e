use axum::{Json, Router, extract::State, routing::get};

use crate::{
    analytics::DashboardAnalytics,
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::dashboard_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/analytics", get(analytics))
}

#[utoipa::path(
    get,
    path = "/api/dashboard/analytics",
    responses(
        (status = 200, description = "Dashboard figures (admin only)", body = ApiResponse<DashboardAnalytics>),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
pub async fn analytics(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardAnalytics>>> {
    let resp = dashboard_service::analytics(&state, &user).await?;
    Ok(Json(resp))
}
