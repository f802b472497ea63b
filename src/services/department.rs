use crate::{
    error::{AppError, AppResult},
    models::DepartmentModel,
    storage::SharedStorage,
};

pub const MAX_DEPARTMENT_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct NewDepartment {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub description: Option<String>,
}

pub struct DepartmentService {
    storage: SharedStorage,
}

impl DepartmentService {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn list(&self) -> AppResult<Vec<DepartmentModel>> {
        self.storage.list_departments().await
    }

    pub async fn get(&self, id: &str) -> AppResult<DepartmentModel> {
        self.storage
            .find_department(id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(&self, input: NewDepartment) -> AppResult<DepartmentModel> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation(
                "Department name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_DEPARTMENT_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Department name must be at most {} characters",
                MAX_DEPARTMENT_NAME_LEN
            )));
        }

        let blank_to_none = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let department = DepartmentModel {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: blank_to_none(input.email),
            phone: blank_to_none(input.phone),
            description: blank_to_none(input.description),
            created_at: chrono::Utc::now().naive_utc(),
        };

        let saved = self.storage.insert_department(department).await?;
        tracing::info!(department_id = %saved.id, name = %saved.name, "Department created");
        Ok(saved)
    }
}
