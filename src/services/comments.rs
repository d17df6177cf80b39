//! Event comments service

use crate::{
    error::{AppError, AppResult},
    models::{
        comment::{Comment, NewComment},
        datetime,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CommentsService {
    repository: Repository,
}

impl CommentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn add(&self, user_id: i64, event_id: i64, data: &NewComment) -> AppResult<Comment> {
        let text = data
            .trimmed_text()
            .ok_or_else(|| AppError::Validation("Comment text must not be blank".to_string()))?;
        self.repository.users.get_by_id(user_id).await?;
        self.repository.events.get_by_id(event_id).await?;

        self.repository
            .comments
            .create(user_id, event_id, text, datetime::now())
            .await
    }

    /// Comments of an event, newest first
    pub async fn list_for_event(&self, event_id: i64) -> AppResult<Vec<Comment>> {
        self.repository.events.get_by_id(event_id).await?;
        self.repository.comments.list_by_event(event_id).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.comments.delete(id).await?;
        tracing::info!("Comment {} deleted", id);
        Ok(())
    }
}
