use crate::{
    error::{AppError, AppResult},
    middleware::auth::{authorize, ensure_report_access, AuthUser, Capability},
    models::{Priority, ReportModel, ReportStatus},
    services::{
        email::EmailService,
        hooks::{default_hooks, run_hooks, ReportEvent, SharedHook},
    },
    storage::{ReportFilter, SharedStorage, StatusChange},
};
use chrono::NaiveDateTime;

pub const MAX_MEDIA_PER_REPORT: usize = 5;
pub const MAX_TITLE_LEN: usize = 200;

/// Submission input. `status` is accepted only so it can be ignored.
#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub category_id: Option<String>,
    pub department_id: Option<String>,
    pub priority: Option<Priority>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub media_urls: Vec<String>,
    pub is_anonymous: bool,
    pub status: Option<String>,
}

impl NewReport {
    /// Title and description rules. Cheap enough to run before any
    /// attachment touches the disk.
    pub fn check_text(&self) -> AppResult<()> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation("Title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(AppError::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation("Description is required".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: ReportStatus,
    /// `None` keeps the assignee, `Some(None)` or `Some(Some(""))` clears it.
    pub assigned_to_id: Option<Option<String>>,
}

/// Optional filters on the report listing. Only admins may use
/// `department_id`; everyone else is pinned to their own reports.
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub status: Option<ReportStatus>,
    pub department_id: Option<String>,
}

pub struct ReportService {
    storage: SharedStorage,
    hooks: Vec<SharedHook>,
}

impl ReportService {
    pub fn new(storage: SharedStorage, email: EmailService) -> Self {
        let hooks = default_hooks(storage.clone(), email);
        Self { storage, hooks }
    }

    pub fn with_hooks(storage: SharedStorage, hooks: Vec<SharedHook>) -> Self {
        Self { storage, hooks }
    }

    pub async fn create(&self, input: NewReport, owner_id: &str) -> AppResult<ReportModel> {
        input.check_text()?;
        let title = input.title.trim();
        let description = input.description.trim();
        if input.media_urls.len() > MAX_MEDIA_PER_REPORT {
            return Err(AppError::Validation(format!(
                "At most {} media files may be attached",
                MAX_MEDIA_PER_REPORT
            )));
        }
        validate_location(input.latitude, input.longitude)?;

        if input.status.is_some() {
            tracing::debug!("Ignoring client-supplied status on report submission");
        }

        self.storage
            .find_user(owner_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let category_id = non_empty(input.category_id);
        let mut department_id = non_empty(input.department_id);
        if let Some(id) = &department_id {
            if self.storage.find_department(id).await?.is_none() {
                return Err(AppError::Validation("Department not found".to_string()));
            }
        }
        if let Some(id) = &category_id {
            let category = self
                .storage
                .find_category(id)
                .await?
                .ok_or_else(|| AppError::Validation("Category not found".to_string()))?;
            // Routing is fixed at submission.
            if category.department_id.is_some() {
                department_id = category.department_id;
            }
        }

        let now = chrono::Utc::now().naive_utc();
        let report = ReportModel {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.to_string(),
            status: ReportStatus::Pending,
            priority: input.priority.unwrap_or_default(),
            category_id,
            department_id,
            user_id: owner_id.to_string(),
            assigned_to_id: None,
            latitude: input.latitude,
            longitude: input.longitude,
            address: non_empty(input.address),
            media_urls: input.media_urls,
            is_anonymous: input.is_anonymous,
            created_at: now,
            updated_at: now,
        };

        let saved = self.storage.insert_report(report).await?;
        tracing::info!(report_id = %saved.id, owner_id, "Report submitted");

        run_hooks(
            &self.hooks,
            &ReportEvent::Submitted {
                report: saved.clone(),
            },
        )
        .await;

        Ok(saved)
    }

    pub async fn update_status(
        &self,
        actor: &AuthUser,
        report_id: &str,
        update: StatusUpdate,
    ) -> AppResult<ReportModel> {
        authorize(Some(actor), Capability::Admin)?;

        let current = self
            .storage
            .find_report(report_id)
            .await?
            .ok_or(AppError::NotFound)?;

        let assigned_to_id = update.assigned_to_id.map(non_empty);
        if let Some(Some(assignee)) = &assigned_to_id {
            if self.storage.find_user(assignee).await?.is_none() {
                return Err(AppError::Validation("Assignee not found".to_string()));
            }
        }

        let change = StatusChange {
            status: update.status,
            assigned_to_id,
            updated_at: next_updated_at(current.updated_at, chrono::Utc::now().naive_utc()),
        };

        let updated = self
            .storage
            .update_report_status(report_id, change)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(
            report_id,
            actor = %actor.user_id,
            from = current.status.as_str(),
            to = updated.status.as_str(),
            "Report status updated"
        );

        run_hooks(
            &self.hooks,
            &ReportEvent::StatusChanged {
                report: updated.clone(),
                previous_status: current.status,
                previous_assignee: current.assigned_to_id,
            },
        )
        .await;

        Ok(updated)
    }

    pub async fn get_for(&self, actor: &AuthUser, report_id: &str) -> AppResult<ReportModel> {
        let report = self
            .storage
            .find_report(report_id)
            .await?
            .ok_or(AppError::NotFound)?;
        ensure_report_access(actor, &report)?;
        Ok(report)
    }

    /// Admins see everything, everyone else only their own reports.
    pub async fn list_for(
        &self,
        actor: &AuthUser,
        query: ReportQuery,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        let filter = if actor.is_admin() {
            ReportFilter {
                user_id: None,
                department_id: non_empty(query.department_id),
                status: query.status,
            }
        } else {
            ReportFilter {
                user_id: Some(actor.user_id.clone()),
                department_id: None,
                status: query.status,
            }
        };
        self.storage.list_reports(&filter, page, per_page).await
    }

    pub async fn list_for_department(
        &self,
        actor: &AuthUser,
        department_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        authorize(Some(actor), Capability::Admin)?;
        if self.storage.find_department(department_id).await?.is_none() {
            return Err(AppError::NotFound);
        }
        let filter = ReportFilter {
            department_id: Some(department_id.to_string()),
            ..ReportFilter::default()
        };
        self.storage.list_reports(&filter, page, per_page).await
    }
}

/// `updated_at` for the next write: now, but never at or before the last.
pub fn next_updated_at(previous: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
    let floor = previous + chrono::Duration::microseconds(1);
    now.max(floor)
}

fn validate_location(latitude: Option<f64>, longitude: Option<f64>) -> AppResult<()> {
    match (latitude, longitude) {
        (None, None) => Ok(()),
        (Some(lat), Some(lng)) => {
            if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::Validation(
                    "Latitude must be between -90 and 90".to_string(),
                ));
            }
            if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
                return Err(AppError::Validation(
                    "Longitude must be between -180 and 180".to_string(),
                ));
            }
            Ok(())
        }
        _ => Err(AppError::Validation(
            "Latitude and longitude must be provided together".to_string(),
        )),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
