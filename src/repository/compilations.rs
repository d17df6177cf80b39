//! Compilations repository

use std::collections::HashMap;

use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        compilation::{CompilationRow, NewCompilation, UpdateCompilation},
        event::Page,
    },
};

#[derive(Clone)]
pub struct CompilationsRepository {
    pool: Pool<Postgres>,
}

impl CompilationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<CompilationRow> {
        sqlx::query_as::<_, CompilationRow>("SELECT id, title, pinned FROM compilations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Compilation with id={} was not found", id)))
    }

    pub async fn list(&self, pinned: Option<bool>, page: Page) -> AppResult<Vec<CompilationRow>> {
        let rows = sqlx::query_as::<_, CompilationRow>(
            r#"
            SELECT id, title, pinned FROM compilations
            WHERE ($1::boolean IS NULL OR pinned = $1)
            ORDER BY id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(pinned)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Event ids of each compilation
    pub async fn event_ids(&self, compilation_ids: &[i64]) -> AppResult<HashMap<i64, Vec<i64>>> {
        if compilation_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT compilation_id, event_id FROM compilation_events
            WHERE compilation_id = ANY($1)
            ORDER BY compilation_id, event_id
            "#,
        )
        .bind(compilation_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in rows {
            map.entry(row.get("compilation_id"))
                .or_default()
                .push(row.get("event_id"));
        }
        Ok(map)
    }

    pub async fn create(&self, data: &NewCompilation) -> AppResult<CompilationRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CompilationRow>(
            "INSERT INTO compilations (title, pinned) VALUES ($1, $2) RETURNING id, title, pinned",
        )
        .bind(&data.title)
        .bind(data.pinned)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_events(&mut tx, row.id, &data.events).await?;

        tx.commit().await?;
        Ok(row)
    }

    pub async fn update(&self, id: i64, data: &UpdateCompilation) -> AppResult<CompilationRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CompilationRow>(
            r#"
            UPDATE compilations
            SET title = COALESCE($1, title), pinned = COALESCE($2, pinned)
            WHERE id = $3
            RETURNING id, title, pinned
            "#,
        )
        .bind(&data.title)
        .bind(data.pinned)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Compilation with id={} was not found", id)))?;

        if let Some(ref events) = data.events {
            Self::replace_events(&mut tx, id, events).await?;
        }

        tx.commit().await?;
        Ok(row)
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM compilations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Compilation with id={} was not found", id)));
        }
        Ok(())
    }

    async fn replace_events(conn: &mut PgConnection, compilation_id: i64, event_ids: &[i64]) -> AppResult<()> {
        sqlx::query("DELETE FROM compilation_events WHERE compilation_id = $1")
            .bind(compilation_id)
            .execute(&mut *conn)
            .await?;

        if !event_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO compilation_events (compilation_id, event_id)
                SELECT $1, UNNEST($2::bigint[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(compilation_id)
            .bind(event_ids)
            .execute(&mut *conn)
            .await?;
        }
        Ok(())
    }
}
