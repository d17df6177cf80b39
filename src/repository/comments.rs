//! Comments repository

use chrono::NaiveDateTime;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::comment::Comment,
};

#[derive(Clone)]
pub struct CommentsRepository {
    pool: Pool<Postgres>,
}

impl CommentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        author_id: i64,
        event_id: i64,
        text: &str,
        created_on: NaiveDateTime,
    ) -> AppResult<Comment> {
        let row = sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (text, author_id, event_id, created_on)
                VALUES ($1, $2, $3, $4)
                RETURNING id, text, author_id, created_on
            )
            SELECT i.id, i.text, u.name AS author_name, i.created_on
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(text)
        .bind(author_id)
        .bind(event_id)
        .bind(created_on)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Comments of an event, newest first
    pub async fn list_by_event(&self, event_id: i64) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.text, u.name AS author_name, c.created_on
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.event_id = $1
            ORDER BY c.created_on DESC, c.id DESC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Comment with id={} was not found", id)));
        }
        Ok(())
    }
}
