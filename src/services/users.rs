//! User administration service

use crate::{
    error::AppResult,
    models::{
        event::Page,
        user::{NewUser, User},
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Users by id, or a page of all users when no id is given
    pub async fn list(&self, ids: &[i64], page: Page) -> AppResult<Vec<User>> {
        self.repository.users.list(ids, page).await
    }

    pub async fn create(&self, data: &NewUser) -> AppResult<User> {
        let user = self.repository.users.create(data).await?;
        tracing::info!("User {} registered", user.id);
        Ok(user)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.users.delete(id).await?;
        tracing::info!("User {} deleted", id);
        Ok(())
    }
}
