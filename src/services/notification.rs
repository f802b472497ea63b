use crate::{
    error::{AppError, AppResult},
    models::{NotificationKind, NotificationModel},
    storage::SharedStorage,
};

pub struct NotificationService {
    storage: SharedStorage,
}

impl NotificationService {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn notify(
        &self,
        user_id: &str,
        report_id: Option<&str>,
        kind: NotificationKind,
        title: &str,
        message: &str,
    ) -> AppResult<NotificationModel> {
        let notification = NotificationModel {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            report_id: report_id.map(str::to_owned),
            kind,
            title: title.to_owned(),
            message: message.to_owned(),
            is_read: false,
            sent_via_email: false,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.insert_notification(notification).await
    }

    pub async fn list_for_user(
        &self,
        user_id: &str,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<NotificationModel>, u64)> {
        self.storage
            .list_notifications(user_id, page, per_page)
            .await
    }

    pub async fn unread_count(&self, user_id: &str) -> AppResult<u64> {
        self.storage.unread_notification_count(user_id).await
    }

    pub async fn mark_read(&self, id: &str, user_id: &str) -> AppResult<()> {
        let existing = self
            .storage
            .find_notification(id)
            .await?
            .ok_or(AppError::NotFound)?;

        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }
        if existing.is_read {
            return Ok(());
        }

        self.storage.mark_notification_read(id).await
    }

    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.storage.mark_all_notifications_read(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    fn service() -> NotificationService {
        NotificationService::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn mark_read_checks_recipient() {
        let service = service();
        let n = service
            .notify("alice", None, NotificationKind::StatusUpdate, "Hi", "msg")
            .await
            .unwrap();

        assert!(matches!(
            service.mark_read(&n.id, "bob").await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            service.mark_read("missing", "alice").await,
            Err(AppError::NotFound)
        ));

        service.mark_read(&n.id, "alice").await.unwrap();
        assert_eq!(service.unread_count("alice").await.unwrap(), 0);
        // Marking twice stays read.
        service.mark_read(&n.id, "alice").await.unwrap();
        assert_eq!(service.unread_count("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn mark_all_only_touches_own_unread() {
        let service = service();
        for _ in 0..3 {
            service
                .notify("alice", None, NotificationKind::StatusUpdate, "t", "m")
                .await
                .unwrap();
        }
        service
            .notify("bob", None, NotificationKind::Resolution, "t", "m")
            .await
            .unwrap();

        assert_eq!(service.mark_all_read("alice").await.unwrap(), 3);
        assert_eq!(service.mark_all_read("alice").await.unwrap(), 0);
        assert_eq!(service.unread_count("bob").await.unwrap(), 1);
    }
}
