use crate::data::category_repository::CategoryRepository;
use crate::domain::error::Validator;
use crate::domain::{Category, DomainError};
use std::sync::Arc;

/// Category management. The dashboard only reads these; create/update/delete
/// exist for whoever curates the directory.
pub struct CategoryService {
    category_repo: Arc<dyn CategoryRepository + Send + Sync>,
}

impl CategoryService {
    pub fn new(category_repo: Arc<dyn CategoryRepository + Send + Sync>) -> Self {
        Self { category_repo }
    }

    pub async fn list(&self, name: Option<&str>) -> Result<Vec<Category>, DomainError> {
        self.category_repo.list(name).await
    }

    pub async fn get(&self, id: i64) -> Result<Category, DomainError> {
        self.category_repo.find_by_id(id).await
    }

    pub async fn create(&self, name: &str) -> Result<Category, DomainError> {
        validate_name(name)?;
        let category = self.category_repo.create(name.trim()).await?;
        tracing::info!("Category created: id={}, name={}", category.id, category.name);
        Ok(category)
    }

    pub async fn update(&self, id: i64, name: &str) -> Result<Category, DomainError> {
        validate_name(name)?;
        let category = self.category_repo.update(id, name.trim()).await?;
        tracing::info!("Category updated: id={}", id);
        Ok(category)
    }

    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        self.category_repo.delete(id).await?;
        tracing::info!("Category deleted: id={}", id);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let mut v = Validator::default();
    if name.trim().is_empty() {
        v.add("name", "The name field is required.");
    }
    v.finish()
}
