use crate::{
    error::{AppError, AppResult},
    models::CategoryModel,
    storage::SharedStorage,
};

pub struct CategoryService {
    storage: SharedStorage,
}

impl CategoryService {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn list(&self) -> AppResult<Vec<CategoryModel>> {
        self.storage.list_categories().await
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
        department_id: Option<String>,
    ) -> AppResult<CategoryModel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required".to_string()));
        }

        let department_id = department_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        if let Some(id) = &department_id {
            if self.storage.find_department(id).await?.is_none() {
                return Err(AppError::Validation("Department not found".to_string()));
            }
        }

        let category = CategoryModel {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.filter(|d| !d.trim().is_empty()),
            department_id,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.storage.insert_category(category).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc;

    #[tokio::test]
    async fn rejects_blank_name_and_unknown_department() {
        let service = CategoryService::new(Arc::new(MemoryStorage::new()));
        assert!(matches!(
            service.create("  ", None, None).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            service
                .create("Roads", None, Some("no-such-dept".to_string()))
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn lists_by_name() {
        let service = CategoryService::new(Arc::new(MemoryStorage::new()));
        service.create("Streetlights", None, None).await.unwrap();
        service.create("Potholes", None, None).await.unwrap();
        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Potholes", "Streetlights"]);
    }
}
