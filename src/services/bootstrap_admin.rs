use crate::config::parse_bool_env;
use crate::error::AppResult;
use crate::models::{Role, UserModel};
use crate::storage::Storage;
use crate::utils::hash_password;
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !parse_bool_env("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        Some(Self {
            username: env::var("BOOTSTRAP_ADMIN_USERNAME").ok()?,
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?,
        })
    }
}

/// Make sure an admin exists at startup:
/// - any existing admin: nothing to do
/// - configured username or email already registered: promote it
/// - otherwise: create a fresh admin account
pub async fn ensure_bootstrap_admin(
    storage: &dyn Storage,
    cfg: Option<BootstrapAdminConfig>,
) -> AppResult<()> {
    let Some(cfg) = cfg else {
        return Ok(());
    };

    if storage.any_user_with_role(Role::Admin).await? {
        return Ok(());
    }

    let existing = match storage.find_user_by_email(&cfg.email).await? {
        Some(user) => Some(user),
        None => storage.find_user_by_username(&cfg.username).await?,
    };

    if let Some(user) = existing {
        storage.set_user_role(&user.id, Role::Admin).await?;
        tracing::info!(username = %user.username, "Promoted existing user to admin");
        return Ok(());
    }

    let admin = UserModel {
        id: uuid::Uuid::new_v4().to_string(),
        username: cfg.username,
        email: cfg.email,
        password_hash: hash_password(&cfg.password)?,
        first_name: None,
        last_name: None,
        role: Role::Admin,
        created_at: chrono::Utc::now().naive_utc(),
    };
    let admin = storage.insert_user(admin).await?;
    tracing::info!(username = %admin.username, "Created bootstrap admin");
    Ok(())
}
