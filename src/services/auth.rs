use crate::{
    error::{AppError, AppResult},
    models::{Role, UserModel},
    storage::SharedStorage,
    utils::{encode_access_token, hash_password, verify_password},
};

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct AuthService {
    storage: SharedStorage,
}

impl AuthService {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Create a citizen account and sign it in.
    /// Returns (user, access_token).
    pub async fn register(&self, input: Registration) -> AppResult<(UserModel, String)> {
        if self.user_exists(&input.username, &input.email).await? {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let user = UserModel {
            id: uuid::Uuid::new_v4().to_string(),
            username: input.username,
            email: input.email,
            password_hash: hash_password(&input.password)?,
            first_name: input.first_name,
            last_name: input.last_name,
            role: Role::Citizen,
            created_at: chrono::Utc::now().naive_utc(),
        };

        let user = self.storage.insert_user(user).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        let token = encode_access_token(&user.id)?;
        Ok((user, token))
    }

    /// Returns (user, access_token).
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = self
            .storage
            .find_user_by_username(username)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = encode_access_token(&user.id)?;
        Ok((user, token))
    }

    pub async fn get_user_by_id(&self, id: &str) -> AppResult<UserModel> {
        self.storage
            .find_user(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn user_exists(&self, username: &str, email: &str) -> AppResult<bool> {
        Ok(self.storage.find_user_by_username(username).await?.is_some()
            || self.storage.find_user_by_email(email).await?.is_some())
    }
}
