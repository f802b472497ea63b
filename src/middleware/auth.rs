use crate::{
    error::{AppError, AppResult},
    models::{ReportModel, Role},
    storage::SharedStorage,
    utils::{
        cookie::{extract_cookie, ACCESS_TOKEN_COOKIE},
        jwt::decode_jwt,
    },
};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};

/// The caller behind a valid session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// What an operation requires of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Public,
    Authenticated,
    Admin,
}

/// Gate an operation. No session fails with `Unauthorized`, a session
/// lacking the role fails with `Forbidden`.
pub fn authorize(user: Option<&AuthUser>, capability: Capability) -> AppResult<()> {
    match (capability, user) {
        (Capability::Public, _) => Ok(()),
        (Capability::Authenticated | Capability::Admin, None) => Err(AppError::Unauthorized),
        (Capability::Authenticated, Some(_)) => Ok(()),
        (Capability::Admin, Some(user)) => match user.role {
            Role::Admin => Ok(()),
            Role::Citizen | Role::Staff => Err(AppError::Forbidden),
        },
    }
}

pub fn require_admin(auth_user: &AuthUser) -> AppResult<()> {
    authorize(Some(auth_user), Capability::Admin)
}

/// Owner or admin may read a report and its media.
pub fn ensure_report_access(auth_user: &AuthUser, report: &ReportModel) -> AppResult<()> {
    if auth_user.is_admin() || auth_user.user_id == report.user_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Resolves the session (bearer header first, then the `access_token`
/// cookie) to a stored user and attaches an [`AuthUser`].
pub async fn auth_middleware(
    Extension(storage): Extension<SharedStorage>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers)
        .or_else(|| extract_cookie(&headers, ACCESS_TOKEN_COOKIE))
        .ok_or(AppError::Unauthorized)?;

    let claims = decode_jwt(&token).map_err(|_| AppError::Unauthorized)?;

    let user = storage
        .find_user(&claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser {
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}
