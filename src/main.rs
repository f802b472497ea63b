use anyhow::Context;
use civic_report::{
    config::{self, database::StorageBackend, rate_limit::RateLimitConfig},
    migration,
    routes::{create_app, AppContext},
    services::{
        bootstrap_admin::{ensure_bootstrap_admin, BootstrapAdminConfig},
        email::EmailService,
        upload::UploadConfig,
    },
    storage::{DatabaseStorage, MemoryStorage, SharedStorage},
    utils,
};
use sea_orm_migration::MigratorTrait;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civic_report=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (jwt_config, backend, upload_config) = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting CivicReport API v{}...", env!("CARGO_PKG_VERSION"));

    let storage: SharedStorage = match backend {
        StorageBackend::Postgres => {
            let db = config::database::get_database().await?;
            tracing::info!("Database connected successfully");

            migration::Migrator::up(&db, None).await?;
            tracing::info!("Database migrations applied successfully");

            Arc::new(DatabaseStorage::new(db))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            Arc::new(MemoryStorage::new())
        }
    };

    ensure_bootstrap_admin(storage.as_ref(), BootstrapAdminConfig::from_env()).await?;

    let email = EmailService::from_env();
    if email.is_configured() {
        tracing::info!("SMTP email service configured");
    }

    let app = create_app(
        AppContext {
            storage,
            email,
            uploads: upload_config,
        },
        &RateLimitConfig::from_env(),
    );

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<(config::jwt::JwtConfig, StorageBackend, UploadConfig)> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    let backend = StorageBackend::from_env()?;
    if backend == StorageBackend::Postgres && env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    let upload_config = UploadConfig::from_env();
    std::fs::create_dir_all(&upload_config.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory '{}'",
            upload_config.upload_dir
        )
    })?;

    Ok((jwt_config, backend, upload_config))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
