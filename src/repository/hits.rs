//! Endpoint hit log repository

use sqlx::{Pool, Postgres, QueryBuilder};

use crate::{
    error::AppResult,
    models::hit::{EndpointHit, NewHit, StatsRequest, ViewStats},
};

/// Build the grouped hit-count query for a stats request.
///
/// The time window is inclusive on both ends; an empty uri list selects
/// every uri.
pub(crate) fn stats_query(req: &StatsRequest) -> QueryBuilder<'static, Postgres> {
    let count = if req.unique { "COUNT(DISTINCT ip)" } else { "COUNT(*)" };

    let mut qb = QueryBuilder::<Postgres>::new(format!(
        "SELECT app, uri, {} AS hits FROM endpoint_hits WHERE timestamp BETWEEN ",
        count
    ));
    qb.push_bind(req.start).push(" AND ").push_bind(req.end);

    if !req.uris.is_empty() {
        qb.push(" AND uri = ANY(").push_bind(req.uris.clone()).push(")");
    }

    qb.push(" GROUP BY app, uri ORDER BY hits DESC, app, uri");
    qb
}

#[derive(Clone)]
pub struct HitsRepository {
    pool: Pool<Postgres>,
}

impl HitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Append a hit
    pub async fn create(&self, hit: &NewHit) -> AppResult<EndpointHit> {
        let row = sqlx::query_as::<_, EndpointHit>(
            r#"
            INSERT INTO endpoint_hits (app, uri, ip, timestamp)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&hit.app)
        .bind(&hit.uri)
        .bind(&hit.ip)
        .bind(hit.timestamp)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Aggregate hits per (app, uri), most viewed first
    pub async fn stats(&self, req: &StatsRequest) -> AppResult<Vec<ViewStats>> {
        let mut qb = stats_query(req);
        let rows = qb.build_query_as::<ViewStats>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
