//! Access to view statistics from the event side

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::hit::{NewHit, StatsRequest, ViewStats},
    services::stats::StatsService,
};

/// Producer and consumer side of the stats component
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsClient: Send + Sync {
    async fn hit(&self, hit: NewHit) -> AppResult<()>;

    async fn get_stats(&self, req: StatsRequest) -> AppResult<Vec<ViewStats>>;
}

/// Stats client backed by the in-process stats service
#[derive(Clone)]
pub struct LocalStatsClient {
    stats: StatsService,
}

impl LocalStatsClient {
    pub fn new(stats: StatsService) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl StatsClient for LocalStatsClient {
    async fn hit(&self, hit: NewHit) -> AppResult<()> {
        self.stats.record_hit(&hit).await?;
        Ok(())
    }

    async fn get_stats(&self, req: StatsRequest) -> AppResult<Vec<ViewStats>> {
        self.stats.get_stats(&req).await
    }
}
