//! Participation requests repository

use std::collections::HashMap;

use chrono::NaiveDateTime;
use sqlx::{PgConnection, Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{enums::RequestStatus, request::ParticipationRequest},
};

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get request by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<ParticipationRequest> {
        sqlx::query_as::<_, ParticipationRequest>("SELECT * FROM participation_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request with id={} was not found", id)))
    }

    /// Requests made by a user, oldest first
    pub async fn list_by_requester(&self, requester_id: i64) -> AppResult<Vec<ParticipationRequest>> {
        let rows = sqlx::query_as::<_, ParticipationRequest>(
            "SELECT * FROM participation_requests WHERE requester_id = $1 ORDER BY id",
        )
        .bind(requester_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Requests made for an event, oldest first
    pub async fn list_by_event(&self, event_id: i64) -> AppResult<Vec<ParticipationRequest>> {
        let rows = sqlx::query_as::<_, ParticipationRequest>(
            "SELECT * FROM participation_requests WHERE event_id = $1 ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Confirmed request count per event, for a whole batch of events.
    ///
    /// Events without confirmed requests are absent from the map.
    pub async fn count_confirmed_by_events(&self, event_ids: &[i64]) -> AppResult<HashMap<i64, i64>> {
        if event_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT event_id, COUNT(*) AS confirmed
            FROM participation_requests
            WHERE event_id = ANY($1) AND status = $2
            GROUP BY event_id
            "#,
        )
        .bind(event_ids)
        .bind(RequestStatus::Confirmed)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| (r.get::<i64, _>("event_id"), r.get::<i64, _>("confirmed")))
            .collect())
    }

    // =========================================================================
    // Transaction-bound operations (caller holds the event row lock)
    // =========================================================================

    /// Whether the requester already holds a request for the event that has
    /// not been canceled
    pub async fn exists_active(
        &self,
        conn: &mut PgConnection,
        requester_id: i64,
        event_id: i64,
    ) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM participation_requests
                WHERE requester_id = $1 AND event_id = $2 AND status <> $3
            )
            "#,
        )
        .bind(requester_id)
        .bind(event_id)
        .bind(RequestStatus::Canceled)
        .fetch_one(&mut *conn)
        .await?;
        Ok(exists)
    }

    pub async fn count_confirmed(&self, conn: &mut PgConnection, event_id: i64) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM participation_requests WHERE event_id = $1 AND status = $2",
        )
        .bind(event_id)
        .bind(RequestStatus::Confirmed)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
        requester_id: i64,
        status: RequestStatus,
        created: NaiveDateTime,
    ) -> AppResult<ParticipationRequest> {
        let row = sqlx::query_as::<_, ParticipationRequest>(
            r#"
            INSERT INTO participation_requests (event_id, requester_id, status, created)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(event_id)
        .bind(requester_id)
        .bind(status)
        .bind(created)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Lock and load the given requests
    pub async fn lock_by_ids(
        &self,
        conn: &mut PgConnection,
        ids: &[i64],
    ) -> AppResult<Vec<ParticipationRequest>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ParticipationRequest>(
            "SELECT * FROM participation_requests WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Lock and load every PENDING request of an event
    pub async fn lock_pending_by_event(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
    ) -> AppResult<Vec<ParticipationRequest>> {
        let rows = sqlx::query_as::<_, ParticipationRequest>(
            r#"
            SELECT * FROM participation_requests
            WHERE event_id = $1 AND status = $2
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(event_id)
        .bind(RequestStatus::Pending)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Set one status on many requests
    pub async fn set_status(
        &self,
        conn: &mut PgConnection,
        ids: &[i64],
        status: RequestStatus,
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("UPDATE participation_requests SET status = $1 WHERE id = ANY($2)")
            .bind(status)
            .bind(ids)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Set the status of a single request and return it
    pub async fn update_status(&self, id: i64, status: RequestStatus) -> AppResult<ParticipationRequest> {
        sqlx::query_as::<_, ParticipationRequest>(
            "UPDATE participation_requests SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request with id={} was not found", id)))
    }
}
