use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::{NotificationKind, NotificationModel};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::notification::NotificationService;
use crate::storage::SharedStorage;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: String,
    pub report_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub sent_via_email: bool,
    pub created_at: String,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            report_id: n.report_id,
            kind: n.kind,
            title: n.title,
            message: n.message,
            is_read: n.is_read,
            sent_via_email: n.sent_via_email,
            created_at: n.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Caller's notifications, newest first", body = PaginatedResponse<NotificationResponse>),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();

    let service = NotificationService::new(storage);
    let (notifications, total) = service
        .list_for_user(&auth_user.user_id, page, per_page)
        .await?;
    let items = notifications
        .into_iter()
        .map(NotificationResponse::from)
        .collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn unread_count(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(storage);
    let count = service.unread_count(&auth_user.user_id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/notifications/{id}/read",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification marked as read", body = String),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 403, description = "Not the recipient", body = crate::error::AppError),
        (status = 404, description = "Notification not found", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(storage);
    service.mark_read(&id, &auth_user.user_id).await?;
    Ok(ApiResponse::ok("Notification marked as read"))
}

#[utoipa::path(
    patch,
    path = "/api/v1/notifications/read-all",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All notifications marked as read", body = serde_json::Value),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn mark_all_read(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(storage);
    let count = service.mark_all_read(&auth_user.user_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "marked_read": count })))
}
