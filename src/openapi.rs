use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health_check,
        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::get_current_user,
        crate::handlers::auth::logout,
        // Reports
        crate::handlers::report::create_report,
        crate::handlers::report::list_reports,
        crate::handlers::report::get_report,
        crate::handlers::report::update_report_status,
        // Categories
        crate::handlers::category::list_categories,
        crate::handlers::category::create_category,
        // Departments
        crate::handlers::department::list_departments,
        crate::handlers::department::create_department,
        crate::handlers::department::list_department_reports,
        // Analytics
        crate::handlers::analytics::report_stats,
        crate::handlers::analytics::category_stats,
        // Notifications
        crate::handlers::notification::list_notifications,
        crate::handlers::notification::unread_count,
        crate::handlers::notification::mark_all_read,
        crate::handlers::notification::mark_read,
        // Media
        crate::handlers::media::serve_media,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::PaginatedResponse<serde_json::Value>,
            crate::response::PaginationQuery,
            crate::error::AppError,
            crate::models::Role,
            crate::models::ReportStatus,
            crate::models::Priority,
            crate::models::NotificationKind,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::UserResponse,
            crate::handlers::report::CreateReportForm,
            crate::handlers::report::UpdateStatusRequest,
            crate::handlers::report::ListReportsQuery,
            crate::handlers::report::ReportResponse,
            crate::handlers::category::CreateCategoryRequest,
            crate::handlers::category::CategoryResponse,
            crate::handlers::department::CreateDepartmentRequest,
            crate::handlers::department::DepartmentResponse,
            crate::services::analytics::ReportStats,
            crate::services::analytics::CategoryCount,
            crate::handlers::notification::NotificationResponse,
            crate::handlers::notification::UnreadCountResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration and sessions"),
        (name = "reports", description = "Report submission and status workflow"),
        (name = "categories", description = "Issue categories"),
        (name = "departments", description = "Municipal departments"),
        (name = "analytics", description = "Admin dashboard aggregates"),
        (name = "notifications", description = "In-app notifications"),
        (name = "media", description = "Report attachments"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "CivicReport API",
        description = "Citizen issue reporting with an admin triage workflow",
    )
)]
pub struct ApiDoc;

/// Registers the `jwt_token` bearer scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_workflow_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/reports/{id}/status"));
        assert!(doc.paths.paths.contains_key("/api/v1/analytics/stats"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("jwt_token"));
    }
}
