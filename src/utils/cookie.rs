use crate::config::parse_bool_env;
use axum::http::{header, HeaderMap};
use std::sync::OnceLock;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

fn secure_cookies() -> bool {
    static SECURE: OnceLock<bool> = OnceLock::new();
    *SECURE.get_or_init(|| parse_bool_env("AUTH_COOKIE_SECURE", false))
}

fn with_flags(mut cookie: String, secure: bool) -> String {
    cookie.push_str("; HttpOnly; SameSite=Lax");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value carrying the session token.
pub fn build_access_cookie(token: &str, max_age_seconds: u64) -> String {
    with_flags(
        format!("{ACCESS_TOKEN_COOKIE}={token}; Path=/; Max-Age={max_age_seconds}"),
        secure_cookies(),
    )
}

/// `Set-Cookie` value that expires the session cookie.
pub fn build_clear_cookie() -> String {
    with_flags(
        format!(
            "{ACCESS_TOKEN_COOKIE}=; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT"
        ),
        secure_cookies(),
    )
}

pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_several() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def; lang=en"),
        );
        assert_eq!(
            extract_cookie(&headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc.def")
        );
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn flags_are_http_only() {
        let set = with_flags("access_token=x; Path=/".to_string(), true);
        assert!(set.contains("HttpOnly"));
        assert!(set.ends_with("; Secure"));
        assert!(!with_flags(String::new(), false).contains("Secure"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        assert!(build_clear_cookie().contains("Max-Age=0"));
    }
}
