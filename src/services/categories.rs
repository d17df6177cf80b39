//! Event categories service

use crate::{
    error::{AppError, AppResult},
    models::{category::Category, event::Page},
    repository::Repository,
};

#[derive(Clone)]
pub struct CategoriesService {
    repository: Repository,
}

impl CategoriesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, id: i64) -> AppResult<Category> {
        self.repository.categories.get_by_id(id).await
    }

    pub async fn list(&self, page: Page) -> AppResult<Vec<Category>> {
        self.repository.categories.list(page).await
    }

    /// Create a category; names are unique
    pub async fn create(&self, name: &str) -> AppResult<Category> {
        self.repository.categories.create(name).await
    }

    pub async fn rename(&self, id: i64, name: &str) -> AppResult<Category> {
        self.repository.categories.rename(id, name).await
    }

    /// Delete a category no event uses
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.categories.get_by_id(id).await?;
        if self.repository.events.exists_by_category(id).await? {
            return Err(AppError::Conflict("The category is not empty".to_string()));
        }
        self.repository.categories.delete(id).await
    }
}
