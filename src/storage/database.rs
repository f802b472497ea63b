use super::{ReportFilter, StatusChange, Storage};
use crate::{
    error::AppResult,
    models::{
        category, department, notification, report, user, Category, CategoryModel, Department,
        DepartmentModel, Notification, NotificationModel, Report, ReportModel, ReportStatus, Role,
        User, UserModel,
    },
};
use async_trait::async_trait;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Statement,
};

/// Postgres-backed storage through sea-orm.
#[derive(Clone)]
pub struct DatabaseStorage {
    db: DatabaseConnection,
}

impl DatabaseStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn filtered_reports(filter: &ReportFilter) -> Select<Report> {
        let mut query = Report::find();
        if let Some(user_id) = &filter.user_id {
            query = query.filter(report::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(department_id) = &filter.department_id {
            query = query.filter(report::Column::DepartmentId.eq(department_id.as_str()));
        }
        if let Some(status) = filter.status {
            query = query.filter(report::Column::Status.eq(status));
        }
        query
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        self.db
            .query_one(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find_by_id(id.to_owned()).one(&self.db).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        Ok(User::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?)
    }

    async fn insert_user(&self, u: UserModel) -> AppResult<UserModel> {
        let model = user::ActiveModel {
            id: sea_orm::ActiveValue::Set(u.id),
            username: sea_orm::ActiveValue::Set(u.username),
            email: sea_orm::ActiveValue::Set(u.email),
            password_hash: sea_orm::ActiveValue::Set(u.password_hash),
            first_name: sea_orm::ActiveValue::Set(u.first_name),
            last_name: sea_orm::ActiveValue::Set(u.last_name),
            role: sea_orm::ActiveValue::Set(u.role),
            created_at: sea_orm::ActiveValue::Set(u.created_at),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn set_user_role(&self, id: &str, role: Role) -> AppResult<Option<UserModel>> {
        let Some(existing) = User::find_by_id(id.to_owned()).one(&self.db).await? else {
            return Ok(None);
        };
        let mut active: user::ActiveModel = existing.into();
        active.role = sea_orm::ActiveValue::Set(role);
        Ok(Some(active.update(&self.db).await?))
    }

    async fn any_user_with_role(&self, role: Role) -> AppResult<bool> {
        let found = User::find()
            .filter(user::Column::Role.eq(role))
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn insert_report(&self, r: ReportModel) -> AppResult<ReportModel> {
        let model = report::ActiveModel {
            id: sea_orm::ActiveValue::Set(r.id),
            title: sea_orm::ActiveValue::Set(r.title),
            description: sea_orm::ActiveValue::Set(r.description),
            status: sea_orm::ActiveValue::Set(r.status),
            priority: sea_orm::ActiveValue::Set(r.priority),
            category_id: sea_orm::ActiveValue::Set(r.category_id),
            department_id: sea_orm::ActiveValue::Set(r.department_id),
            user_id: sea_orm::ActiveValue::Set(r.user_id),
            assigned_to_id: sea_orm::ActiveValue::Set(r.assigned_to_id),
            latitude: sea_orm::ActiveValue::Set(r.latitude),
            longitude: sea_orm::ActiveValue::Set(r.longitude),
            address: sea_orm::ActiveValue::Set(r.address),
            media_urls: sea_orm::ActiveValue::Set(r.media_urls),
            is_anonymous: sea_orm::ActiveValue::Set(r.is_anonymous),
            created_at: sea_orm::ActiveValue::Set(r.created_at),
            updated_at: sea_orm::ActiveValue::Set(r.updated_at),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn find_report(&self, id: &str) -> AppResult<Option<ReportModel>> {
        Ok(Report::find_by_id(id.to_owned()).one(&self.db).await?)
    }

    async fn find_report_by_media(&self, url: &str) -> AppResult<Option<ReportModel>> {
        Ok(Report::find()
            .filter(Expr::cust_with_values(
                "$1 = ANY(media_urls)",
                [url.to_owned()],
            ))
            .one(&self.db)
            .await?)
    }

    async fn list_reports(
        &self,
        filter: &ReportFilter,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ReportModel>, u64)> {
        let paginator = Self::filtered_reports(filter)
            .order_by_desc(report::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let reports = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((reports, total))
    }

    async fn update_report_status(
        &self,
        id: &str,
        change: StatusChange,
    ) -> AppResult<Option<ReportModel>> {
        let Some(existing) = Report::find_by_id(id.to_owned()).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: report::ActiveModel = existing.into();
        active.status = sea_orm::ActiveValue::Set(change.status);
        if let Some(assignee) = change.assigned_to_id {
            active.assigned_to_id = sea_orm::ActiveValue::Set(assignee);
        }
        active.updated_at = sea_orm::ActiveValue::Set(change.updated_at);

        Ok(Some(active.update(&self.db).await?))
    }

    async fn count_reports_by_status(&self) -> AppResult<Vec<(ReportStatus, u64)>> {
        let rows: Vec<(ReportStatus, i64)> = Report::find()
            .select_only()
            .column(report::Column::Status)
            .column_as(Expr::col(report::Column::Id).count(), "count")
            .group_by(report::Column::Status)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(status, count)| (status, count.max(0) as u64))
            .collect())
    }

    async fn count_reports_by_category(&self) -> AppResult<Vec<(Option<String>, u64)>> {
        let rows: Vec<(Option<String>, i64)> = Report::find()
            .select_only()
            .column(report::Column::CategoryId)
            .column_as(Expr::col(report::Column::Id).count(), "count")
            .group_by(report::Column::CategoryId)
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(category_id, count)| (category_id, count.max(0) as u64))
            .collect())
    }

    async fn list_categories(&self) -> AppResult<Vec<CategoryModel>> {
        Ok(Category::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await?)
    }

    async fn find_category(&self, id: &str) -> AppResult<Option<CategoryModel>> {
        Ok(Category::find_by_id(id.to_owned()).one(&self.db).await?)
    }

    async fn insert_category(&self, c: CategoryModel) -> AppResult<CategoryModel> {
        let model = category::ActiveModel {
            id: sea_orm::ActiveValue::Set(c.id),
            name: sea_orm::ActiveValue::Set(c.name),
            description: sea_orm::ActiveValue::Set(c.description),
            department_id: sea_orm::ActiveValue::Set(c.department_id),
            created_at: sea_orm::ActiveValue::Set(c.created_at),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn list_departments(&self) -> AppResult<Vec<DepartmentModel>> {
        Ok(Department::find()
            .order_by_asc(department::Column::Name)
            .all(&self.db)
            .await?)
    }

    async fn find_department(&self, id: &str) -> AppResult<Option<DepartmentModel>> {
        Ok(Department::find_by_id(id.to_owned()).one(&self.db).await?)
    }

    async fn insert_department(&self, d: DepartmentModel) -> AppResult<DepartmentModel> {
        let model = department::ActiveModel {
            id: sea_orm::ActiveValue::Set(d.id),
            name: sea_orm::ActiveValue::Set(d.name),
            email: sea_orm::ActiveValue::Set(d.email),
            phone: sea_orm::ActiveValue::Set(d.phone),
            description: sea_orm::ActiveValue::Set(d.description),
            created_at: sea_orm::ActiveValue::Set(d.created_at),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn insert_notification(&self, n: NotificationModel) -> AppResult<NotificationModel> {
        let model = notification::ActiveModel {
            id: sea_orm::ActiveValue::Set(n.id),
            user_id: sea_orm::ActiveValue::Set(n.user_id),
            report_id: sea_orm::ActiveValue::Set(n.report_id),
            kind: sea_orm::ActiveValue::Set(n.kind),
            title: sea_orm::ActiveValue::Set(n.title),
            message: sea_orm::ActiveValue::Set(n.message),
            is_read: sea_orm::ActiveValue::Set(n.is_read),
            sent_via_email: sea_orm::ActiveValue::Set(n.sent_via_email),
            created_at: sea_orm::ActiveValue::Set(n.created_at),
        };
        Ok(model.insert(&self.db).await?)
    }

    async fn find_notification(&self, id: &str) -> AppResult<Option<NotificationModel>> {
        Ok(Notification::find_by_id(id.to_owned())
            .one(&self.db)
            .await?)
    }

    async fn list_notifications(
        &self,
        user_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<NotificationModel>, u64)> {
        let paginator = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn unread_notification_count(&self, user_id: &str) -> AppResult<u64> {
        let count = Notification::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn mark_notification_read(&self, id: &str) -> AppResult<()> {
        Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> AppResult<u64> {
        let result = Notification::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }
}
