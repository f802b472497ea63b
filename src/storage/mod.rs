//! Persistence seam for the five record types.
//!
//! The service layer only sees `Arc<dyn Storage>`; `main` picks the backend
//! once at startup and hands it to every service through an axum
//! `Extension`. Tests use [`MemoryStorage`].

mod database;
mod memory;

pub use database::DatabaseStorage;
pub use memory::MemoryStorage;

use crate::error::AppResult;
use crate::models::{
    CategoryModel, DepartmentModel, NotificationModel, ReportModel, ReportStatus, Role, UserModel,
};
use async_trait::async_trait;
use std::sync::Arc;

pub type SharedStorage = Arc<dyn Storage>;

/// Optional constraints applied when listing reports.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub user_id: Option<String>,
    pub department_id: Option<String>,
    pub status: Option<ReportStatus>,
}

impl ReportFilter {
    pub fn matches(&self, report: &ReportModel) -> bool {
        self.user_id.as_ref().map_or(true, |id| &report.user_id == id)
            && self
                .department_id
                .as_ref()
                .map_or(true, |id| report.department_id.as_ref() == Some(id))
            && self.status.map_or(true, |s| report.status == s)
    }
}

/// Fields written by a status transition.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: ReportStatus,
    /// `None` leaves the assignee untouched, `Some(None)` clears it.
    pub assigned_to_id: Option<Option<String>>,
    pub updated_at: chrono::NaiveDateTime,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Short tag used in logs and the health check.
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> AppResult<()>;

    // Users
    async fn find_user(&self, id: &str) -> AppResult<Option<UserModel>>;
    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserModel>>;
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>>;
    async fn insert_user(&self, user: UserModel) -> AppResult<UserModel>;
    async fn set_user_role(&self, id: &str, role: Role) -> AppResult<Option<UserModel>>;
    async fn any_user_with_role(&self, role: Role) -> AppResult<bool>;

    // Reports
    async fn insert_report(&self, report: ReportModel) -> AppResult<ReportModel>;
    async fn find_report(&self, id: &str) -> AppResult<Option<ReportModel>>;
    async fn find_report_by_media(&self, url: &str) -> AppResult<Option<ReportModel>>;
    /// Newest first. Returns the page and the total number of matches.
    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)>;
    /// Returns `None` when no report has this id.
    async fn update_report_status(
        &self,
        id: &str,
        change: StatusChange,
    ) -> AppResult<Option<ReportModel>>;
    async fn count_reports_by_status(&self) -> AppResult<Vec<(ReportStatus, u64)>>;
    async fn count_reports_by_category(&self) -> AppResult<Vec<(Option<String>, u64)>>;

    // Categories
    async fn list_categories(&self) -> AppResult<Vec<CategoryModel>>;
    async fn find_category(&self, id: &str) -> AppResult<Option<CategoryModel>>;
    async fn insert_category(&self, category: CategoryModel) -> AppResult<CategoryModel>;

    // Departments
    async fn list_departments(&self) -> AppResult<Vec<DepartmentModel>>;
    async fn find_department(&self, id: &str) -> AppResult<Option<DepartmentModel>>;
    async fn insert_department(&self, department: DepartmentModel) -> AppResult<DepartmentModel>;

    // Notifications
    async fn insert_notification(
        &self,
        notification: NotificationModel,
    ) -> AppResult<NotificationModel>;
    async fn find_notification(&self, id: &str) -> AppResult<Option<NotificationModel>>;
    /// Newest first. Returns the page and the total for this user.
    async fn list_notifications(
        &self,
        user_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<NotificationModel>, u64)>;
    async fn unread_notification_count(&self, user_id: &str) -> AppResult<u64>;
    async fn mark_notification_read(&self, id: &str) -> AppResult<()>;
    async fn mark_all_notifications_read(&self, user_id: &str) -> AppResult<u64>;
}
