//! Side effects that run after a report mutation has been persisted.
//!
//! Each hook is awaited in turn; a failing hook is logged and skipped so it
//! can neither affect the next hook nor the caller's result.

use crate::{
    models::{NotificationKind, ReportModel, ReportStatus},
    services::{email::EmailService, notification::NotificationService},
    storage::SharedStorage,
};
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum ReportEvent {
    Submitted {
        report: ReportModel,
    },
    StatusChanged {
        report: ReportModel,
        previous_status: ReportStatus,
        previous_assignee: Option<String>,
    },
}

impl ReportEvent {
    pub fn report(&self) -> &ReportModel {
        match self {
            ReportEvent::Submitted { report } | ReportEvent::StatusChanged { report, .. } => report,
        }
    }

    /// Notification category for this event.
    pub fn kind(&self) -> NotificationKind {
        match self {
            ReportEvent::Submitted { .. } => NotificationKind::StatusUpdate,
            ReportEvent::StatusChanged {
                report,
                previous_assignee,
                ..
            } => {
                if report.status == ReportStatus::Resolved {
                    NotificationKind::Resolution
                } else if report.assigned_to_id.is_some()
                    && report.assigned_to_id != *previous_assignee
                {
                    NotificationKind::Assignment
                } else {
                    NotificationKind::StatusUpdate
                }
            }
        }
    }

    pub fn title(&self) -> &'static str {
        match (self, self.kind()) {
            (ReportEvent::Submitted { .. }, _) => "Report Submitted",
            (_, NotificationKind::Resolution) => "Report Resolved",
            (_, NotificationKind::Assignment) => "Report Assigned",
            (_, NotificationKind::StatusUpdate) => "Report Status Updated",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ReportEvent::Submitted { report } => format!(
                "Your report \"{}\" has been submitted and is being reviewed.",
                report.title
            ),
            ReportEvent::StatusChanged {
                report,
                previous_status,
                ..
            } => format!(
                "Your report \"{}\" status has been updated from {} to {}.",
                report.title,
                previous_status.label(),
                report.status.label()
            ),
        }
    }

    /// `(old, new)` status strings handed to the email dispatcher.
    fn email_statuses(&self) -> (&'static str, &'static str) {
        match self {
            ReportEvent::Submitted { report } => ("", report.status.as_str()),
            ReportEvent::StatusChanged {
                report,
                previous_status,
                ..
            } => (previous_status.as_str(), report.status.as_str()),
        }
    }
}

#[async_trait]
pub trait ReportHook: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_event(&self, event: &ReportEvent) -> anyhow::Result<()>;
}

pub type SharedHook = Arc<dyn ReportHook>;

/// Run every hook in order, swallowing failures.
pub async fn run_hooks(hooks: &[SharedHook], event: &ReportEvent) {
    for hook in hooks {
        if let Err(e) = hook.on_event(event).await {
            tracing::warn!(
                hook = hook.name(),
                report_id = %event.report().id,
                "Report hook failed: {e:#}"
            );
        }
    }
}

/// Hooks installed on every production `ReportService`.
pub fn default_hooks(storage: SharedStorage, email: EmailService) -> Vec<SharedHook> {
    vec![
        Arc::new(NotificationHook::new(storage.clone())),
        Arc::new(EmailHook::new(storage, email)),
    ]
}

/// Writes one in-app notification to the report owner.
pub struct NotificationHook {
    notifications: NotificationService,
}

impl NotificationHook {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            notifications: NotificationService::new(storage),
        }
    }
}

#[async_trait]
impl ReportHook for NotificationHook {
    fn name(&self) -> &'static str {
        "notification"
    }

    async fn on_event(&self, event: &ReportEvent) -> anyhow::Result<()> {
        let report = event.report();
        self.notifications
            .notify(
                &report.user_id,
                Some(&report.id),
                event.kind(),
                event.title(),
                &event.message(),
            )
            .await?;
        Ok(())
    }
}

/// Mails the report owner, when they have an address on file.
pub struct EmailHook {
    storage: SharedStorage,
    email: EmailService,
}

impl EmailHook {
    pub fn new(storage: SharedStorage, email: EmailService) -> Self {
        Self { storage, email }
    }
}

#[async_trait]
impl ReportHook for EmailHook {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn on_event(&self, event: &ReportEvent) -> anyhow::Result<()> {
        let report = event.report();
        let Some(owner) = self.storage.find_user(&report.user_id).await? else {
            anyhow::bail!("owner {} of report {} not found", report.user_id, report.id);
        };
        if owner.email.trim().is_empty() {
            return Ok(());
        }

        let (old, new) = event.email_statuses();
        if !self
            .email
            .send_status_update(&owner.email, &report.title, old, new)
            .await
        {
            anyhow::bail!("delivery to {} failed", owner.email);
        }
        Ok(())
    }
}
