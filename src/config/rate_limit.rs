use super::parse_bool_env;
use std::env;

/// Token-bucket parameters for one route group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGroup {
    /// Register and login.
    Auth,
    /// Unauthenticated reads (category listing).
    Public,
    /// Everything behind the session check.
    Protected,
}

impl RouteGroup {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auth" => Some(Self::Auth),
            "public" | "public_read" | "public-read" => Some(Self::Public),
            "protected" => Some(Self::Protected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub public: RateLimitRule,
    pub protected: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            public: RateLimitRule::new(30, 60),
            protected: RateLimitRule::new(10, 20),
        }
    }
}

impl RateLimitConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        let mut cfg = Self {
            enabled: parse_bool_env("RATE_LIMIT_ENABLED", true),
            ..Self::default()
        };

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            if let Err(err) = cfg.apply(&raw) {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
            }
        }

        cfg
    }

    pub fn rule(&self, group: RouteGroup) -> RateLimitRule {
        match group {
            RouteGroup::Auth => self.auth,
            RouteGroup::Public => self.public,
            RouteGroup::Protected => self.protected,
        }
    }

    fn rule_mut(&mut self, group: RouteGroup) -> &mut RateLimitRule {
        match group {
            RouteGroup::Auth => &mut self.auth,
            RouteGroup::Public => &mut self.public,
            RouteGroup::Protected => &mut self.protected,
        }
    }

    /// Apply `"10:20"` (every group) or `"auth=5:10,public=30:60"`.
    /// Nothing is changed if any item fails to parse.
    fn apply(&mut self, raw: &str) -> Result<(), String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty value".to_string());
        }

        let mut next = *self;
        if !trimmed.contains('=') {
            let rule = parse_rule(trimmed)?;
            next.auth = rule;
            next.public = rule;
            next.protected = rule;
        } else {
            for item in trimmed.split(',').map(str::trim).filter(|i| !i.is_empty()) {
                let (name, raw_rule) = item
                    .split_once('=')
                    .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
                let group = RouteGroup::parse(name).ok_or_else(|| {
                    format!(
                        "unknown group '{}', expected auth/public/protected",
                        name.trim()
                    )
                })?;
                *next.rule_mut(group) = parse_rule(raw_rule.trim())?;
            }
        }

        *self = next;
        Ok(())
    }
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second_raw, burst_raw) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second_raw.trim()))?;
    let burst_size: u32 = burst_raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst_raw.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}
