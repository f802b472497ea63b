use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::response::ApiResponse;
use crate::services::analytics::{AnalyticsService, CategoryCount, ReportStats};
use crate::storage::SharedStorage;
use axum::{response::IntoResponse, Extension};

#[utoipa::path(
    get,
    path = "/api/v1/analytics/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Report counts by status", body = ReportStats),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "analytics"
)]
pub async fn report_stats(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    let stats = AnalyticsService::new(storage).stats().await?;
    Ok(ApiResponse::ok(stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/analytics/categories",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Report counts by category", body = Vec<CategoryCount>),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "analytics"
)]
pub async fn category_stats(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    let rows = AnalyticsService::new(storage)
        .reports_by_category()
        .await?;
    Ok(ApiResponse::ok(rows))
}
