//! Business logic services

pub mod categories;
pub mod comments;
pub mod compilations;
pub mod events;
pub mod requests;
pub mod stats;
pub mod stats_client;
pub mod users;

use std::sync::Arc;

use crate::{config::StatsConfig, repository::Repository};

use stats_client::{LocalStatsClient, StatsClient};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub categories: categories::CategoriesService,
    pub events: events::EventsService,
    pub requests: requests::RequestsService,
    pub comments: comments::CommentsService,
    pub compilations: compilations::CompilationsService,
    pub stats: stats::StatsService,
    pub repository: Repository,
}

impl Services {
    /// Create all services with the given repository.
    ///
    /// Event views are read through the in-process stats service.
    pub fn new(repository: Repository, stats_config: &StatsConfig) -> Self {
        let stats = stats::StatsService::new(repository.clone());
        let client: Arc<dyn StatsClient> = Arc::new(LocalStatsClient::new(stats.clone()));
        Self::with_stats_client(repository, stats, client, stats_config)
    }

    /// Same as [`Services::new`] with a caller-provided stats client
    pub fn with_stats_client(
        repository: Repository,
        stats: stats::StatsService,
        client: Arc<dyn StatsClient>,
        stats_config: &StatsConfig,
    ) -> Self {
        let events = events::EventsService::new(repository.clone(), client, stats_config.app_name.clone());
        Self {
            users: users::UsersService::new(repository.clone()),
            categories: categories::CategoriesService::new(repository.clone()),
            requests: requests::RequestsService::new(repository.clone()),
            comments: comments::CommentsService::new(repository.clone()),
            compilations: compilations::CompilationsService::new(repository.clone(), events.clone()),
            events,
            stats,
            repository,
        }
    }
}
