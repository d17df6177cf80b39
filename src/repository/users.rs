//! Users repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        event::Page,
        user::{NewUser, User},
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id={} was not found", id)))
    }

    /// Users with the given ids, or a page of all users when `ids` is empty
    pub async fn list(&self, ids: &[i64], page: Page) -> AppResult<Vec<User>> {
        let users = if ids.is_empty() {
            sqlx::query_as::<_, User>("SELECT id, name, email FROM users ORDER BY id LIMIT $1 OFFSET $2")
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await?
        } else {
            sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = ANY($1) ORDER BY id")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?
        };
        Ok(users)
    }

    /// Create a user; a taken email is a conflict
    pub async fn create(&self, data: &NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id, name, email",
        )
        .bind(&data.name)
        .bind(&data.email)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id={} was not found", id)));
        }
        Ok(())
    }
}
