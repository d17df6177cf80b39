//! Hit log and view statistics

use chrono::NaiveDateTime;

use crate::{
    error::{AppError, AppResult},
    models::hit::{EndpointHit, NewHit, StatsRequest, ViewStats},
    repository::Repository,
};

/// Reject a window whose start lies after its end
pub fn validate_range(start: NaiveDateTime, end: NaiveDateTime) -> AppResult<()> {
    if start > end {
        return Err(AppError::InvalidArgument(
            "Start date cannot be after end date.".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
}

impl StatsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Append one hit to the log
    pub async fn record_hit(&self, hit: &NewHit) -> AppResult<EndpointHit> {
        let saved = self.repository.hits.create(hit).await?;
        tracing::debug!("Recorded hit {} {} from {}", saved.app, saved.uri, saved.ip);
        Ok(saved)
    }

    /// Hit counts per (app, uri) inside an inclusive time window
    pub async fn get_stats(&self, req: &StatsRequest) -> AppResult<Vec<ViewStats>> {
        validate_range(req.start, req.end)?;
        self.repository.hits.stats(req).await
    }
}
