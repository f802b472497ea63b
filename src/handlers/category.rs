use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::CategoryModel;
use crate::response::ApiResponse;
use crate::services::category::CategoryService;
use crate::storage::SharedStorage;
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    /// Category name (1-100 characters)
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    /// Department that receives reports filed under this category
    #[serde(alias = "departmentId")]
    pub department_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub department_id: Option<String>,
    pub created_at: String,
}

impl From<CategoryModel> for CategoryResponse {
    fn from(c: CategoryModel) -> Self {
        Self {
            id: c.id,
            name: c.name,
            description: c.description,
            department_id: c.department_id,
            created_at: c.created_at.to_string(),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "All categories", body = Vec<CategoryResponse>),
    ),
    tag = "categories"
)]
pub async fn list_categories(
    Extension(storage): Extension<SharedStorage>,
) -> AppResult<impl IntoResponse> {
    let service = CategoryService::new(storage);
    let categories: Vec<CategoryResponse> = service
        .list()
        .await?
        .into_iter()
        .map(CategoryResponse::from)
        .collect();
    Ok(ApiResponse::ok(categories))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    security(("jwt_token" = [])),
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "categories"
)]
pub async fn create_category(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth_user)?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = CategoryService::new(storage);
    let category = service
        .create(&payload.name, payload.description, payload.department_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(CategoryResponse::from(category)),
    ))
}
