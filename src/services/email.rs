use crate::config::email::EmailConfig;
use anyhow::{Context, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Fixed phrase describing each status in outbound mail.
pub fn status_phrase(status: &str) -> String {
    match status {
        "pending" => "has been received and is being reviewed".to_string(),
        "in_progress" => "is now being worked on by our team".to_string(),
        "resolved" => "has been resolved".to_string(),
        other => format!("status has been updated to {}", other),
    }
}

/// Subject and plain-text body of a status email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEmail {
    pub subject: String,
    pub body: String,
}

impl StatusEmail {
    pub fn compose(report_title: &str, old_status: &str, new_status: &str) -> Self {
        let summary = format!("Your report \"{}\" {}.", report_title, status_phrase(new_status));
        let mut body = format!("Hello,\n\n{}\n\nReport: {}\n", summary, report_title);
        if !old_status.is_empty() && old_status != new_status {
            body.push_str(&format!("Previous status: {}\n", old_status.replace('_', " ")));
        }
        body.push_str(&format!(
            "Status: {}\n\nThank you for helping improve our community!\n\nBest regards,\nCivicReport Team\n",
            new_status.replace('_', " ")
        ));

        Self {
            subject: format!("Report Update: {}", report_title),
            body,
        }
    }
}

/// Status-change mail dispatcher.
///
/// Live when SMTP credentials are configured. In disabled mode every send
/// is logged and reported as delivered so callers behave identically.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl EmailService {
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(cfg) => Self::from_config(cfg),
            None => {
                tracing::warn!("SMTP not configured, status emails are disabled");
                Self::disabled()
            }
        }
    }

    pub fn from_config(cfg: EmailConfig) -> Self {
        let creds = Credentials::new(cfg.smtp_username, cfg.smtp_password);
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build());

        match transport {
            Ok(t) => Self {
                transport: Some(t),
                from_address: cfg.from_address,
            },
            Err(e) => {
                tracing::error!(
                    host = %cfg.smtp_host,
                    "SMTP credentials are set but the transport could not be built, status emails are disabled: {e}"
                );
                Self {
                    transport: None,
                    from_address: cfg.from_address,
                }
            }
        }
    }

    /// Dispatcher that never touches the network.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_address: crate::config::email::DEFAULT_FROM_ADDRESS.to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// Tell `to` that a report moved from `old_status` to `new_status`.
    /// `old_status` is empty for a fresh submission. Never fails: the
    /// outcome is the returned flag.
    pub async fn send_status_update(
        &self,
        to: &str,
        report_title: &str,
        old_status: &str,
        new_status: &str,
    ) -> bool {
        let email = StatusEmail::compose(report_title, old_status, new_status);

        let Some(transport) = &self.transport else {
            tracing::info!("Email would be sent to {to}: {}", email.subject);
            return true;
        };

        match self.deliver(transport, to, &email).await {
            Ok(()) => {
                tracing::info!("Email sent to {to}: {}", email.subject);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to send status email to {to}: {e:#}");
                false
            }
        }
    }

    async fn deliver(
        &self,
        transport: &AsyncSmtpTransport<Tokio1Executor>,
        to: &str,
        email: &StatusEmail,
    ) -> Result<()> {
        let from_mailbox: Mailbox = self
            .from_address
            .parse()
            .with_context(|| format!("Invalid from address '{}'", self.from_address))?;
        let to_mailbox: Mailbox = to
            .parse()
            .with_context(|| format!("Invalid to address '{}'", to))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())?;

        transport.send(message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_table() {
        assert_eq!(
            status_phrase("pending"),
            "has been received and is being reviewed"
        );
        assert_eq!(
            status_phrase("in_progress"),
            "is now being worked on by our team"
        );
        assert_eq!(status_phrase("resolved"), "has been resolved");
        assert_eq!(
            status_phrase("archived"),
            "status has been updated to archived"
        );
    }

    #[test]
    fn compose_uses_title_and_phrase() {
        let email = StatusEmail::compose("Pothole on Elm St", "pending", "resolved");
        assert_eq!(email.subject, "Report Update: Pothole on Elm St");
        assert!(email
            .body
            .contains("Your report \"Pothole on Elm St\" has been resolved."));
        assert!(email.body.contains("Previous status: pending"));
        assert!(email.body.contains("Status: resolved"));
    }

    #[test]
    fn compose_for_submission_omits_previous_status() {
        let email = StatusEmail::compose("Broken light", "", "in_progress");
        assert!(!email.body.contains("Previous status"));
        assert!(email.body.contains("Status: in progress"));
    }

    #[tokio::test]
    async fn credentials_build_a_live_transport() {
        let service = EmailService::from_config(EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 2525,
            smtp_username: "mailer".to_string(),
            smtp_password: "hunter2".to_string(),
            from_address: crate::config::email::DEFAULT_FROM_ADDRESS.to_string(),
        });
        assert!(service.is_configured());
    }

    #[tokio::test]
    async fn disabled_mode_reports_success() {
        let service = EmailService::disabled();
        assert!(!service.is_configured());
        assert!(
            service
                .send_status_update("citizen@example.com", "Graffiti", "pending", "resolved")
                .await
        );
    }
}
