use crate::error::{AppError, AppResult};
use crate::handlers::report::ReportResponse;
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::DepartmentModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::department::{DepartmentService, NewDepartment};
use crate::services::email::EmailService;
use crate::services::report::ReportService;
use crate::storage::SharedStorage;
use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDepartmentRequest {
    /// Department name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Contact address
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DepartmentResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

impl From<DepartmentModel> for DepartmentResponse {
    fn from(d: DepartmentModel) -> Self {
        Self {
            id: d.id,
            name: d.name,
            email: d.email,
            phone: d.phone,
            description: d.description,
            created_at: d.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/departments",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All departments", body = Vec<DepartmentResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "departments"
)]
pub async fn list_departments(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    let service = DepartmentService::new(storage);
    let departments: Vec<DepartmentResponse> = service
        .list()
        .await?
        .into_iter()
        .map(DepartmentResponse::from)
        .collect();
    Ok(ApiResponse::ok(departments))
}

#[utoipa::path(
    post,
    path = "/api/v1/departments",
    security(("jwt_token" = [])),
    request_body = CreateDepartmentRequest,
    responses(
        (status = 201, description = "Department created", body = DepartmentResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "departments"
)]
pub async fn create_department(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
    Json(payload): Json<CreateDepartmentRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = DepartmentService::new(storage);
    let department = service
        .create(NewDepartment {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            description: payload.description,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(DepartmentResponse::from(department)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/departments/{id}/reports",
    security(("jwt_token" = [])),
    params(
        ("id" = String, Path, description = "Department ID"),
        ("page" = Option<u64>, Query, description = "Page number"),
        ("per_page" = Option<u64>, Query, description = "Items per page"),
    ),
    responses(
        (status = 200, description = "Reports routed to the department", body = PaginatedResponse<ReportResponse>),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Department not found", body = AppError),
    ),
    tag = "departments"
)]
pub async fn list_department_reports(
    Extension(storage): Extension<SharedStorage>,
    Extension(email): Extension<EmailService>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let service = ReportService::new(storage, email);
    let (reports, total) = service
        .list_for_department(&auth_user, &id, page, per_page)
        .await?;
    let items = reports.into_iter().map(ReportResponse::from).collect();
    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}
