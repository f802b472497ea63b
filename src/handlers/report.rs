use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::{Priority, ReportModel, ReportStatus};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::email::EmailService;
use crate::services::report::{
    NewReport, ReportQuery, ReportService, StatusUpdate, MAX_MEDIA_PER_REPORT,
};
use crate::services::upload::{PendingUpload, UploadConfig, UploadService};
use crate::storage::SharedStorage;
use axum::{
    extract::{Multipart, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Multipart form accepted by `POST /reports`. Every field except `media`
/// is a text part; `media` may repeat up to five times.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct CreateReportForm {
    pub title: String,
    pub description: String,
    pub category_id: Option<String>,
    pub department_id: Option<String>,
    pub priority: Option<Priority>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_anonymous: Option<bool>,
    #[schema(value_type = Vec<String>, format = Binary)]
    pub media: Vec<Vec<u8>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// pending, in_progress or resolved
    pub status: String,
    /// Omit to keep the assignee; null or "" to unassign
    #[serde(
        default,
        alias = "assignedToId",
        deserialize_with = "present_or_null"
    )]
    #[schema(value_type = Option<String>)]
    pub assigned_to_id: Option<Option<String>>,
}

fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ListReportsQuery {
    /// Filter by status
    pub status: Option<String>,
    /// Filter by department (admins only)
    pub department_id: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: ReportStatus,
    pub priority: Priority,
    pub category_id: Option<String>,
    pub department_id: Option<String>,
    pub user_id: String,
    pub assigned_to_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub media_urls: Vec<String>,
    pub is_anonymous: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ReportModel> for ReportResponse {
    fn from(r: ReportModel) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            status: r.status,
            priority: r.priority,
            category_id: r.category_id,
            department_id: r.department_id,
            user_id: r.user_id,
            assigned_to_id: r.assigned_to_id,
            latitude: r.latitude,
            longitude: r.longitude,
            address: r.address,
            media_urls: r.media_urls,
            is_anonymous: r.is_anonymous,
            created_at: r.created_at.to_string(),
            updated_at: r.updated_at.to_string(),
        }
    }
}

fn parse_number(name: &str, value: &str) -> AppResult<Option<f64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| AppError::Validation(format!("{name} must be a number")))
}

fn parse_priority(value: &str) -> AppResult<Option<Priority>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    value.parse().map(Some).map_err(AppError::Validation)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Split the multipart body into text fields and pending files.
async fn read_report_form(mut multipart: Multipart) -> AppResult<(NewReport, Vec<PendingUpload>)> {
    let mut input = NewReport::default();
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_some() || name == "media" {
            if uploads.len() == MAX_MEDIA_PER_REPORT {
                return Err(AppError::Validation(format!(
                    "At most {} media files may be attached",
                    MAX_MEDIA_PER_REPORT
                )));
            }
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;
            uploads.push(PendingUpload {
                file_name,
                content_type,
                data: data.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read field {}: {}", name, e)))?;

        match name.as_str() {
            "title" => input.title = value,
            "description" => input.description = value,
            "category_id" | "categoryId" => input.category_id = Some(value),
            "department_id" | "departmentId" => input.department_id = Some(value),
            "priority" => input.priority = parse_priority(&value)?,
            "address" => input.address = Some(value),
            "latitude" => input.latitude = parse_number("latitude", &value)?,
            "longitude" => input.longitude = parse_number("longitude", &value)?,
            "is_anonymous" | "isAnonymous" => input.is_anonymous = parse_flag(&value),
            "status" => input.status = Some(value),
            _ => tracing::debug!("Ignoring unknown report field '{}'", name),
        }
    }

    Ok((input, uploads))
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    request_body(content = CreateReportForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Report submitted", body = ReportResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(storage): Extension<SharedStorage>,
    Extension(email): Extension<EmailService>,
    Extension(upload_config): Extension<UploadConfig>,
    auth_user: AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let (mut input, uploads) = read_report_form(multipart).await?;
    input.check_text()?;

    let staged = UploadService::stage_all(&upload_config, uploads).await?;
    input.media_urls = staged.urls.clone();

    let service = ReportService::new(storage, email);
    match service.create(input, &auth_user.user_id).await {
        Ok(report) => Ok((
            StatusCode::CREATED,
            ApiResponse::ok(ReportResponse::from(report)),
        )),
        Err(e) => {
            staged.discard().await;
            Err(e)
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("department_id" = Option<String>, Query, description = "Filter by department (admin)"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Reports visible to the caller", body = PaginatedResponse<ReportResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_reports(
    Extension(storage): Extension<SharedStorage>,
    Extension(email): Extension<EmailService>,
    auth_user: AuthUser,
    Query(params): Query<ListReportsQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    }
    .resolve();

    let status = params
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<ReportStatus>)
        .transpose()
        .map_err(AppError::Validation)?;

    let service = ReportService::new(storage, email);
    let (reports, total) = service
        .list_for(
            &auth_user,
            ReportQuery {
                status,
                department_id: params.department_id,
            },
            page,
            per_page,
        )
        .await?;

    let items = reports.into_iter().map(ReportResponse::from).collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/{id}",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report", body = ReportResponse),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn get_report(
    Extension(storage): Extension<SharedStorage>,
    Extension(email): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = ReportService::new(storage, email);
    let report = service.get_for(&auth_user, &id).await?;
    Ok(ApiResponse::ok(ReportResponse::from(report)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/reports/{id}/status",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Report ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Report updated", body = ReportResponse),
        (status = 400, description = "Invalid status or assignee", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn update_report_status(
    Extension(storage): Extension<SharedStorage>,
    Extension(email): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    let status: ReportStatus = payload.status.parse().map_err(AppError::Validation)?;

    let service = ReportService::new(storage, email);
    let report = service
        .update_status(
            &auth_user,
            &id,
            StatusUpdate {
                status,
                assigned_to_id: payload.assigned_to_id,
            },
        )
        .await?;

    Ok(ApiResponse::ok(ReportResponse::from(report)))
}
