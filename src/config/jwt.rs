use anyhow::{bail, Context, Result};

pub const MIN_SECRET_LEN: usize = 32;
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 24 * 60 * 60;

/// Signing key and session lifetime for issued access tokens.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret = get("JWT_SECRET").context("JWT_SECRET environment variable must be set")?;
        if secret.len() < MIN_SECRET_LEN {
            bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} characters");
        }

        let access_token_expiry = match get("JWT_ACCESS_EXPIRATION") {
            None => DEFAULT_ACCESS_TTL_SECS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => bail!("JWT_ACCESS_EXPIRATION must be positive"),
                Ok(secs) => secs,
                Err(_) => bail!("JWT_ACCESS_EXPIRATION must be a number of seconds, got '{raw}'"),
            },
        };

        Ok(Self {
            secret,
            access_token_expiry,
        })
    }
}
