//! Event compilations service

use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        compilation::{Compilation, CompilationRow, NewCompilation, UpdateCompilation},
        event::{EventShort, Page},
    },
    repository::Repository,
    services::events::EventsService,
};

/// Combine compilation rows with their already enriched events
fn assemble(
    rows: Vec<CompilationRow>,
    mut event_ids: HashMap<i64, Vec<i64>>,
    shorts: &HashMap<i64, EventShort>,
) -> Vec<Compilation> {
    rows.into_iter()
        .map(|row| {
            let events = event_ids
                .remove(&row.id)
                .unwrap_or_default()
                .iter()
                .filter_map(|id| shorts.get(id).cloned())
                .collect();
            Compilation {
                id: row.id,
                title: row.title,
                pinned: row.pinned,
                events,
            }
        })
        .collect()
}

#[derive(Clone)]
pub struct CompilationsService {
    repository: Repository,
    events: EventsService,
}

impl CompilationsService {
    pub fn new(repository: Repository, events: EventsService) -> Self {
        Self { repository, events }
    }

    async fn with_events(&self, rows: Vec<CompilationRow>) -> AppResult<Vec<Compilation>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let event_ids = self.repository.compilations.event_ids(&ids).await?;

        let mut all: Vec<i64> = event_ids.values().flatten().copied().collect();
        all.sort_unstable();
        all.dedup();

        let events = self.repository.events.list_by_ids(&all).await?;
        let shorts: HashMap<i64, EventShort> = self
            .events
            .short_list(events)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();

        Ok(assemble(rows, event_ids, &shorts))
    }

    async fn one(&self, row: CompilationRow) -> AppResult<Compilation> {
        self.with_events(vec![row])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("Compilation lost while loading events".to_string()))
    }

    async fn ensure_events_exist(&self, ids: &[i64]) -> AppResult<()> {
        if let Some(id) = self.repository.events.missing_ids(ids).await?.first() {
            return Err(AppError::NotFound(format!("Event with id={} was not found", id)));
        }
        Ok(())
    }

    pub async fn get(&self, id: i64) -> AppResult<Compilation> {
        let row = self.repository.compilations.get_by_id(id).await?;
        self.one(row).await
    }

    pub async fn list(&self, pinned: Option<bool>, page: Page) -> AppResult<Vec<Compilation>> {
        let rows = self.repository.compilations.list(pinned, page).await?;
        self.with_events(rows).await
    }

    pub async fn create(&self, data: &NewCompilation) -> AppResult<Compilation> {
        self.ensure_events_exist(&data.events).await?;
        let row = self.repository.compilations.create(data).await?;
        tracing::info!("Compilation {} created with {} event(s)", row.id, data.events.len());
        self.one(row).await
    }

    pub async fn update(&self, id: i64, data: &UpdateCompilation) -> AppResult<Compilation> {
        if let Some(ref events) = data.events {
            self.ensure_events_exist(events).await?;
        }
        let row = self.repository.compilations.update(id, data).await?;
        self.one(row).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.compilations.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{sample_event, EventCounters};

    #[test]
    fn test_assemble_keeps_rows_and_skips_unknown_events() {
        let rows = vec![
            CompilationRow {
                id: 1,
                title: "Summer".into(),
                pinned: true,
            },
            CompilationRow {
                id: 2,
                title: "Empty".into(),
                pinned: false,
            },
        ];
        let event_ids = HashMap::from([(1, vec![10, 11, 99])]);
        let events: HashMap<i64, EventShort> = [10, 11]
            .into_iter()
            .map(|id| (id, EventShort::new(sample_event(id, 0, true), EventCounters::default())))
            .collect();

        let result = assemble(rows, event_ids, &events);
        assert_eq!(result.len(), 2);
        let ids: Vec<i64> = result[0].events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert!(result[1].events.is_empty());
    }
}
