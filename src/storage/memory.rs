use super::{ReportFilter, StatusChange, Storage};
use crate::{
    error::{AppError, AppResult},
    models::{
        CategoryModel, DepartmentModel, NotificationModel, ReportModel, ReportStatus, Role,
        UserModel,
    },
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process storage used by tests and `STORAGE_BACKEND=memory`.
///
/// Every row carries an insertion sequence so "newest first" stays stable
/// when two rows share a timestamp.
#[derive(Default)]
pub struct MemoryStorage {
    seq: AtomicU64,
    users: DashMap<String, (u64, UserModel)>,
    reports: DashMap<String, (u64, ReportModel)>,
    categories: DashMap<String, (u64, CategoryModel)>,
    departments: DashMap<String, (u64, DepartmentModel)>,
    notifications: DashMap<String, (u64, NotificationModel)>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Sort `(seq, created_at, row)` newest first and slice out one page.
    fn page<T>(
        mut rows: Vec<(u64, chrono::NaiveDateTime, T)>,
        page: u64,
        per_page: u64,
    ) -> (Vec<T>, u64) {
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
        let total = rows.len() as u64;
        let skip = page.saturating_sub(1).saturating_mul(per_page) as usize;
        let items = rows
            .into_iter()
            .skip(skip)
            .take(per_page as usize)
            .map(|(_, _, row)| row)
            .collect();
        (items, total)
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<UserModel>> {
        Ok(self.users.get(id).map(|entry| entry.1.clone()))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserModel>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.1.username == username)
            .map(|entry| entry.1.clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.1.email == email)
            .map(|entry| entry.1.clone()))
    }

    async fn insert_user(&self, user: UserModel) -> AppResult<UserModel> {
        // Mirrors the unique constraints on the users table.
        let duplicate = self
            .users
            .iter()
            .any(|entry| entry.1.username == user.username || entry.1.email == user.email);
        if duplicate {
            return Err(AppError::Internal(anyhow::anyhow!(
                "unique constraint violated on users"
            )));
        }
        let seq = self.next_seq();
        self.users.insert(user.id.clone(), (seq, user.clone()));
        Ok(user)
    }

    async fn set_user_role(&self, id: &str, role: Role) -> AppResult<Option<UserModel>> {
        Ok(self.users.get_mut(id).map(|mut entry| {
            entry.1.role = role;
            entry.1.clone()
        }))
    }

    async fn any_user_with_role(&self, role: Role) -> AppResult<bool> {
        Ok(self.users.iter().any(|entry| entry.1.role == role))
    }

    async fn insert_report(&self, report: ReportModel) -> AppResult<ReportModel> {
        let seq = self.next_seq();
        self.reports.insert(report.id.clone(), (seq, report.clone()));
        Ok(report)
    }

    async fn find_report(&self, id: &str) -> AppResult<Option<ReportModel>> {
        Ok(self.reports.get(id).map(|entry| entry.1.clone()))
    }

    async fn find_report_by_media(&self, url: &str) -> AppResult<Option<ReportModel>> {
        Ok(self
            .reports
            .iter()
            .find(|entry| entry.1.media_urls.iter().any(|m| m == url))
            .map(|entry| entry.1.clone()))
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        let rows = self
            .reports
            .iter()
            .filter(|entry| filter.matches(&entry.1))
            .map(|entry| (entry.0, entry.1.created_at, entry.1.clone()))
            .collect();
        Ok(Self::page(rows, page, per_page))
    }

    async fn update_report_status(
        &self,
        id: &str,
        change: StatusChange,
    ) -> AppResult<Option<ReportModel>> {
        Ok(self.reports.get_mut(id).map(|mut entry| {
            let report = &mut entry.1;
            report.status = change.status;
            if let Some(assignee) = change.assigned_to_id {
                report.assigned_to_id = assignee;
            }
            report.updated_at = change.updated_at;
            report.clone()
        }))
    }

    async fn count_reports_by_status(&self) -> AppResult<Vec<(ReportStatus, u64)>> {
        let mut counts: HashMap<ReportStatus, u64> = HashMap::new();
        for entry in self.reports.iter() {
            *counts.entry(entry.1.status).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn count_reports_by_category(&self) -> AppResult<Vec<(Option<String>, u64)>> {
        let mut counts: HashMap<Option<String>, u64> = HashMap::new();
        for entry in self.reports.iter() {
            *counts.entry(entry.1.category_id.clone()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn list_categories(&self) -> AppResult<Vec<CategoryModel>> {
        let mut categories: Vec<CategoryModel> =
            self.categories.iter().map(|entry| entry.1.clone()).collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: &str) -> AppResult<Option<CategoryModel>> {
        Ok(self.categories.get(id).map(|entry| entry.1.clone()))
    }

    async fn insert_category(&self, category: CategoryModel) -> AppResult<CategoryModel> {
        let seq = self.next_seq();
        self.categories
            .insert(category.id.clone(), (seq, category.clone()));
        Ok(category)
    }

    async fn list_departments(&self) -> AppResult<Vec<DepartmentModel>> {
        let mut departments: Vec<DepartmentModel> =
            self.departments.iter().map(|entry| entry.1.clone()).collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn find_department(&self, id: &str) -> AppResult<Option<DepartmentModel>> {
        Ok(self.departments.get(id).map(|entry| entry.1.clone()))
    }

    async fn insert_department(&self, department: DepartmentModel) -> AppResult<DepartmentModel> {
        let seq = self.next_seq();
        self.departments
            .insert(department.id.clone(), (seq, department.clone()));
        Ok(department)
    }

    async fn insert_notification(
        &self,
        notification: NotificationModel,
    ) -> AppResult<NotificationModel> {
        let seq = self.next_seq();
        self.notifications
            .insert(notification.id.clone(), (seq, notification.clone()));
        Ok(notification)
    }

    async fn find_notification(&self, id: &str) -> AppResult<Option<NotificationModel>> {
        Ok(self.notifications.get(id).map(|entry| entry.1.clone()))
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<NotificationModel>, u64)> {
        let rows = self
            .notifications
            .iter()
            .filter(|entry| entry.1.user_id == user_id)
            .map(|entry| (entry.0, entry.1.created_at, entry.1.clone()))
            .collect();
        Ok(Self::page(rows, page, per_page))
    }

    async fn unread_notification_count(&self, user_id: &str) -> AppResult<u64> {
        Ok(self
            .notifications
            .iter()
            .filter(|entry| entry.1.user_id == user_id && !entry.1.is_read)
            .count() as u64)
    }

    async fn mark_notification_read(&self, id: &str) -> AppResult<()> {
        if let Some(mut entry) = self.notifications.get_mut(id) {
            entry.1.is_read = true;
        }
        Ok(())
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> AppResult<u64> {
        let mut marked = 0;
        for mut entry in self.notifications.iter_mut() {
            if entry.1.user_id == user_id && !entry.1.is_read {
                entry.1.is_read = true;
                marked += 1;
            }
        }
        Ok(marked)
    }
}
