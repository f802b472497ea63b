use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Role, UserModel};
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, Registration};
use crate::storage::SharedStorage;
use crate::utils::{
    cookie::{build_access_cookie, build_clear_cookie},
    jwt::access_token_ttl,
};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token, also set as the `access_token` cookie
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub created_at: String,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            created_at: user.created_at.to_string(),
        }
    }
}

fn set_cookie(response: &mut Response, cookie: String) -> AppResult<()> {
    let value = HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid cookie header: {e}")))?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

fn session_response(status: StatusCode, user: UserModel, token: String) -> AppResult<Response> {
    let cookie = build_access_cookie(&token, access_token_ttl()?);
    let body = AuthResponse {
        token,
        user: UserResponse::from(user),
    };
    let mut response = (status, ApiResponse::ok(body)).into_response();
    set_cookie(&mut response, cookie)?;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 409, description = "Username or email already exists", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(storage): Extension<SharedStorage>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Response> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(storage);
    let (user, token) = service
        .register(Registration {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    session_response(StatusCode::CREATED, user, token)
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(storage): Extension<SharedStorage>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Response> {
    let service = AuthService::new(storage);
    let (user, token) = service.login(&payload.username, &payload.password).await?;
    session_response(StatusCode::OK, user, token)
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(storage): Extension<SharedStorage>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(storage);
    let user = service.get_user_by_id(&auth_user.user_id).await?;
    Ok(ApiResponse::ok(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Session cookie cleared", body = String),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn logout(_auth_user: AuthUser) -> AppResult<Response> {
    let mut response = ApiResponse::ok("Logged out").into_response();
    set_cookie(&mut response, build_clear_cookie())?;
    Ok(response)
}
