use crate::config::jwt::JwtConfig;
use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static JWT_CONFIG: OnceLock<JwtConfig> = OnceLock::new();

/// Install the signing config. Called once at startup; later calls fail.
pub fn init_jwt_config(config: JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))
}

fn config() -> Result<&'static JwtConfig> {
    JWT_CONFIG
        .get()
        .context("JWT config not initialized, call init_jwt_config() at startup")
}

/// Lifetime of an access token in seconds, used for the cookie Max-Age.
pub fn access_token_ttl() -> Result<u64> {
    Ok(config()?.access_token_expiry)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn encode_access_token(user_id: &str) -> Result<String> {
    let config = config()?;
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_owned(),
        exp: now + config.access_token_expiry as usize,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .context("Failed to encode access token")
}

pub fn decode_jwt(token: &str) -> Result<Claims> {
    let config = config()?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .context("Failed to decode JWT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn ensure_config() {
        INIT.call_once(|| {
            let _ = init_jwt_config(JwtConfig {
                secret: "unit_test_secret_that_is_long_enough_for_hs256".to_string(),
                access_token_expiry: 3600,
            });
        });
    }

    #[test]
    fn token_carries_subject_and_expiry() {
        ensure_config();
        let token = encode_access_token("user-1").unwrap();
        let claims = decode_jwt(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn tampered_token_fails() {
        ensure_config();
        let token = encode_access_token("user-1").unwrap();
        let mut chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_jwt(&tampered).is_err());
    }

    #[test]
    fn expired_token_fails() {
        ensure_config();
        let secret = config().unwrap().secret.clone();
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "user-1".to_string(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_jwt(&token).is_err());
    }

    #[test]
    fn garbage_fails() {
        ensure_config();
        assert!(decode_jwt("").is_err());
        assert!(decode_jwt("not.a.jwt").is_err());
    }
}
