pub const DEFAULT_FROM_ADDRESS: &str = "CivicReport <noreply@civicreport.com>";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP relay settings for the live email dispatcher.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
}

impl EmailConfig {
    /// `None` unless host, username and password are all set and
    /// non-blank; the dispatcher then runs disabled.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let present = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let smtp_host = present("SMTP_HOST")?;
        let smtp_username = present("SMTP_USERNAME")?;
        let smtp_password = present("SMTP_PASSWORD")?;
        let smtp_port = match present("SMTP_PORT").map(|p| p.trim().parse::<u16>()) {
            Some(Ok(port)) => port,
            Some(Err(_)) => {
                tracing::warn!("Ignoring invalid SMTP_PORT, using {}", DEFAULT_SMTP_PORT);
                DEFAULT_SMTP_PORT
            }
            None => DEFAULT_SMTP_PORT,
        };
        let from_address =
            present("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string());

        Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_address,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn needs_host_user_and_password() {
        let full = [
            ("SMTP_HOST", "smtp.city.gov"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "hunter2"),
        ];
        let cfg = EmailConfig::from_lookup(lookup(&full)).unwrap();
        assert_eq!(cfg.smtp_port, DEFAULT_SMTP_PORT);
        assert_eq!(cfg.from_address, DEFAULT_FROM_ADDRESS);

        assert!(EmailConfig::from_lookup(lookup(&full[..2])).is_none());
        let blank_host = [
            ("SMTP_HOST", "  "),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "hunter2"),
        ];
        assert!(EmailConfig::from_lookup(lookup(&blank_host)).is_none());
    }

    #[test]
    fn port_and_sender_overrides() {
        let pairs = [
            ("SMTP_HOST", "smtp.city.gov"),
            ("SMTP_USERNAME", "mailer"),
            ("SMTP_PASSWORD", "hunter2"),
            ("SMTP_PORT", "2525"),
            ("SMTP_FROM", "Public Works <works@city.gov>"),
        ];
        let cfg = EmailConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.smtp_port, 2525);
        assert_eq!(cfg.from_address, "Public Works <works@city.gov>");
    }
}
