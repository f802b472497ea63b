use crate::error::{AppError, AppResult};
use crate::middleware::auth::{ensure_report_access, AuthUser};
use crate::services::upload::{UploadConfig, UploadService};
use crate::storage::SharedStorage;
use axum::{
    body::Body,
    extract::{Path, Request},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Extension,
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

#[utoipa::path(
    get,
    path = "/uploads/{path}",
    security(("jwt_token" = [])),
    params(("path" = String, Path, description = "Media path below /uploads")),
    responses(
        (status = 200, description = "Media file"),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 403, description = "Not the report owner", body = AppError),
        (status = 404, description = "Unknown media path", body = AppError),
    ),
    tag = "media"
)]
pub async fn serve_media(
    Extension(storage): Extension<SharedStorage>,
    Extension(config): Extension<UploadConfig>,
    auth_user: AuthUser,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let url = UploadService::media_url(&path).ok_or(AppError::NotFound)?;
    let report = storage
        .find_report_by_media(&url)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_report_access(&auth_user, &report)?;

    let uri = served_path(&url)
        .and_then(|path| path.parse::<axum::http::Uri>().ok())
        .ok_or(AppError::NotFound)?;
    let mut request = Request::new(Body::empty());
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;

    match ServeDir::new(&config.upload_dir).oneshot(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(never) => match never {},
    }
}

/// Path below the upload root for a stored media URL.
fn served_path(url: &str) -> Option<&str> {
    url.strip_prefix("/uploads")
        .filter(|rest| rest.starts_with('/'))
}
