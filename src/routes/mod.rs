use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::openapi::ApiDoc;
use crate::services::{email::EmailService, upload::UploadConfig};
use crate::storage::SharedStorage;
use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{header, HeaderValue, Method},
    middleware, routing, Json, Router,
};
use serde_json::json;
use std::env;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Five attachments at the per-file cap plus room for the text fields.
const REPORT_BODY_LIMIT: usize = 5 * crate::services::upload::MAX_FILE_SIZE + 1024 * 1024;

/// Everything the handlers pull out of request extensions.
#[derive(Clone)]
pub struct AppContext {
    pub storage: SharedStorage,
    pub email: EmailService,
    pub uploads: UploadConfig,
}

pub fn create_app(ctx: AppContext, rate_limit: &RateLimitConfig) -> Router {
    Router::new()
        .route("/", routing::get(health_check))
        .merge(create_routes(rate_limit))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .layer(Extension(ctx.storage))
        .layer(Extension(ctx.email))
        .layer(Extension(ctx.uploads))
}

pub fn create_routes(rate_limit: &RateLimitConfig) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(rate_limit))
        .merge(media_routes(rate_limit))
}

fn api_routes(config: &RateLimitConfig) -> Router {
    let auth = auth_routes(config);
    let public_read = public_read_routes(config);
    let protected = protected_routes(config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Register and login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route(
        "/categories",
        routing::get(handlers::category::list_categories),
    );

    with_optional_rate_limit(router, config.enabled, config.public)
}

/// Everything behind a session. Admin-only handlers check the role
/// themselves.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        .route("/auth/logout", routing::post(handlers::logout))
        // Reports
        .route(
            "/reports",
            routing::get(handlers::report::list_reports)
                .post(handlers::report::create_report)
                .layer(DefaultBodyLimit::max(REPORT_BODY_LIMIT)),
        )
        .route("/reports/{id}", routing::get(handlers::report::get_report))
        .route(
            "/reports/{id}/status",
            routing::patch(handlers::report::update_report_status),
        )
        // Categories (admin)
        .route(
            "/categories",
            routing::post(handlers::category::create_category),
        )
        // Departments (admin)
        .route(
            "/departments",
            routing::get(handlers::department::list_departments)
                .post(handlers::department::create_department),
        )
        .route(
            "/departments/{id}/reports",
            routing::get(handlers::department::list_department_reports),
        )
        // Analytics (admin)
        .route(
            "/analytics/stats",
            routing::get(handlers::analytics::report_stats),
        )
        .route(
            "/analytics/categories",
            routing::get(handlers::analytics::category_stats),
        )
        // Notifications
        .route(
            "/notifications",
            routing::get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            routing::get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            routing::patch(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            routing::patch(handlers::notification::mark_read),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

/// Attachments live outside `/api/v1` but still need a session.
fn media_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/uploads/{*path}",
            routing::get(handlers::media::serve_media),
        )
        .layer(middleware::from_fn(auth_middleware));

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!("Invalid rate limit rule {:?}, serving without a limit", rule);
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}

fn build_cors_layer() -> CorsLayer {
    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service and storage status", body = serde_json::Value)
    )
)]
pub async fn health_check(Extension(storage): Extension<SharedStorage>) -> Json<serde_json::Value> {
    let storage_ok = storage.ping().await.is_ok();
    let status = if storage_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "CivicReport API",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": storage.backend(),
        "storage_ok": storage_ok,
    }))
}
