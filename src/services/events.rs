//! Event lifecycle, search and enrichment

use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, NaiveDateTime};

use crate::{
    error::{AppError, AppResult},
    models::{
        datetime,
        enums::{AdminStateAction, EventSort, EventState, UserStateAction},
        event::{
            event_uri, AdminEventFilter, Event, EventCounters, EventFull, EventPatch, EventShort,
            NewEvent, Page, PublicEventFilter, UpdateEventAdmin, UpdateEventUser, EVENT_URI_PREFIX,
        },
        hit::{NewHit, StatsRequest, ViewStats},
    },
    repository::{events::EventChanges, Repository},
    services::stats_client::StatsClient,
};

/// Uri recorded for public event searches
pub const EVENTS_URI: &str = "/events";

/// Time window covering every view of a batch of events.
///
/// Starts at the earliest event date, clamped so it never passes `now`.
pub fn views_window(events: &[Event], now: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let start = events
        .iter()
        .map(|e| e.event_date)
        .min()
        .map_or(now, |earliest| earliest.min(now));
    (start, now)
}

/// Unique view counts keyed by event id, read back from stats uris
pub fn views_by_event(stats: &[ViewStats]) -> HashMap<i64, i64> {
    stats
        .iter()
        .filter_map(|s| {
            let id = s.uri.strip_prefix(EVENT_URI_PREFIX)?.parse::<i64>().ok()?;
            Some((id, s.hits))
        })
        .collect()
}

/// Keep events that still have a free participant slot
pub fn retain_available(enriched: &mut Vec<(Event, EventCounters)>) {
    enriched.retain(|(event, counters)| !event.is_full(counters.confirmed_requests));
}

/// Most viewed first; ties keep their order
pub fn sort_by_views(events: &mut [EventShort]) {
    events.sort_by(|a, b| b.views.cmp(&a.views));
}

/// Reject a date closer to `now` than `min_ahead`
pub fn check_event_date(
    date: NaiveDateTime,
    now: NaiveDateTime,
    min_ahead: Duration,
    message: &str,
) -> AppResult<()> {
    if date < now + min_ahead {
        return Err(AppError::Conflict(format!(
            "{} Value: {}",
            message,
            datetime::format(&date)
        )));
    }
    Ok(())
}

/// State reached by an initiator edit
pub fn apply_user_action(
    event: &Event,
    action: Option<UserStateAction>,
) -> AppResult<Option<EventState>> {
    if event.state == EventState::Published {
        return Err(AppError::Conflict(
            "Only pending or canceled events can be changed".to_string(),
        ));
    }
    Ok(action.map(|a| match a {
        UserStateAction::SendToReview => EventState::Pending,
        UserStateAction::CancelReview => EventState::Canceled,
    }))
}

/// State and publication time reached by an administrator edit.
///
/// `event_date` is the date the event will have after the edit.
pub fn apply_admin_action(
    event: &Event,
    action: Option<AdminStateAction>,
    event_date: NaiveDateTime,
    now: NaiveDateTime,
) -> AppResult<(Option<EventState>, Option<NaiveDateTime>)> {
    match action {
        None => Ok((None, None)),
        Some(AdminStateAction::PublishEvent) => {
            if event.state != EventState::Pending {
                return Err(AppError::Conflict(format!(
                    "Cannot publish the event because it's not in the right state: {}",
                    event.state
                )));
            }
            if event_date < now + Duration::hours(1) {
                return Err(AppError::Conflict(
                    "Cannot publish the event because its start date is less than 1 hour from now."
                        .to_string(),
                ));
            }
            Ok((Some(EventState::Published), Some(now)))
        }
        Some(AdminStateAction::RejectEvent) => {
            if event.state == EventState::Published {
                return Err(AppError::Conflict(
                    "Cannot reject the event because it's already published.".to_string(),
                ));
            }
            Ok((Some(EventState::Canceled), None))
        }
    }
}

fn changes_from_patch(patch: &EventPatch) -> EventChanges {
    EventChanges {
        title: patch.title.clone(),
        annotation: patch.annotation.clone(),
        description: patch.description.clone(),
        category_id: patch.category,
        event_date: patch.event_date,
        location: patch.location,
        paid: patch.paid,
        participant_limit: patch.participant_limit,
        request_moderation: patch.request_moderation,
        state: None,
        published_on: None,
    }
}

#[derive(Clone)]
pub struct EventsService {
    repository: Repository,
    stats: Arc<dyn StatsClient>,
    app_name: String,
}

impl EventsService {
    pub fn new(repository: Repository, stats: Arc<dyn StatsClient>, app_name: String) -> Self {
        Self {
            repository,
            stats,
            app_name,
        }
    }

    // =========================================================================
    // Enrichment
    // =========================================================================

    /// Attach view and confirmed-request counters to a batch of events.
    ///
    /// One stats call and one grouped count query per batch; missing
    /// counters default to 0.
    pub async fn enrich(&self, events: Vec<Event>) -> AppResult<Vec<(Event, EventCounters)>> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        let (start, end) = views_window(&events, datetime::now());
        let stats = self
            .stats
            .get_stats(StatsRequest {
                start,
                end,
                uris: events.iter().map(Event::uri).collect(),
                unique: true,
            })
            .await?;
        let views = views_by_event(&stats);
        let confirmed = self.repository.requests.count_confirmed_by_events(&ids).await?;

        Ok(events
            .into_iter()
            .map(|event| {
                let counters = EventCounters {
                    views: views.get(&event.id).copied().unwrap_or(0),
                    confirmed_requests: confirmed.get(&event.id).copied().unwrap_or(0),
                };
                (event, counters)
            })
            .collect())
    }

    async fn full(&self, event: Event) -> AppResult<EventFull> {
        let mut enriched = self.enrich(vec![event]).await?;
        let (event, counters) = enriched
            .pop()
            .ok_or_else(|| AppError::Internal("Enrichment lost an event".to_string()))?;
        Ok(EventFull::new(event, counters))
    }

    /// Short representations of the given events, in the same order
    pub async fn short_list(&self, events: Vec<Event>) -> AppResult<Vec<EventShort>> {
        Ok(self
            .enrich(events)
            .await?
            .into_iter()
            .map(|(event, counters)| EventShort::new(event, counters))
            .collect())
    }

    /// Best-effort hit recording; failures are logged, never returned
    pub(crate) async fn record_hit(&self, uri: String, ip: &str) {
        let hit = NewHit {
            app: self.app_name.clone(),
            uri,
            ip: ip.to_string(),
            timestamp: datetime::now(),
        };
        if let Err(e) = self.stats.hit(hit).await {
            tracing::warn!("Failed to record hit: {}", e);
        }
    }

    // =========================================================================
    // Initiator operations
    // =========================================================================

    pub async fn create_event(&self, user_id: i64, data: &NewEvent) -> AppResult<EventFull> {
        let now = datetime::now();
        check_event_date(
            data.event_date,
            now,
            Duration::hours(2),
            "Event date must be at least 2 hours in the future.",
        )?;
        self.repository.users.get_by_id(user_id).await?;
        self.repository.categories.get_by_id(data.category).await?;

        let event = self.repository.events.create(user_id, data, now).await?;
        tracing::info!("Event {} created by user {}", event.id, user_id);
        Ok(EventFull::new(event, EventCounters::default()))
    }

    pub async fn get_user_events(&self, user_id: i64, page: Page) -> AppResult<Vec<EventShort>> {
        self.repository.users.get_by_id(user_id).await?;
        let events = self.repository.events.list_by_initiator(user_id, page).await?;
        self.short_list(events).await
    }

    pub async fn get_user_event(&self, user_id: i64, event_id: i64) -> AppResult<EventFull> {
        self.repository.users.get_by_id(user_id).await?;
        let event = self.repository.events.get_by_id(event_id).await?;
        if event.initiator_id != user_id {
            return Err(AppError::NotFound(format!(
                "Event with id={} was not found",
                event_id
            )));
        }
        self.full(event).await
    }

    pub async fn update_by_initiator(
        &self,
        user_id: i64,
        event_id: i64,
        update: &UpdateEventUser,
    ) -> AppResult<EventFull> {
        self.repository.users.get_by_id(user_id).await?;
        let event = self.repository.events.get_by_id(event_id).await?;
        if event.initiator_id != user_id {
            return Err(AppError::Conflict(
                "User is not the initiator of the event.".to_string(),
            ));
        }

        let state = apply_user_action(&event, update.state_action)?;
        if let Some(date) = update.patch.event_date {
            check_event_date(
                date,
                datetime::now(),
                Duration::hours(2),
                "Event date must be at least 2 hours in the future.",
            )?;
        }
        if let Some(category_id) = update.patch.category {
            self.repository.categories.get_by_id(category_id).await?;
        }

        let changes = EventChanges {
            state,
            ..changes_from_patch(&update.patch)
        };
        let updated = self.repository.events.update(event_id, &changes).await?;
        self.full(updated).await
    }

    // =========================================================================
    // Administrator operations
    // =========================================================================

    pub async fn update_by_admin(
        &self,
        event_id: i64,
        update: &UpdateEventAdmin,
    ) -> AppResult<EventFull> {
        let event = self.repository.events.get_by_id(event_id).await?;
        let now = datetime::now();

        if let Some(date) = update.patch.event_date {
            check_event_date(date, now, Duration::zero(), "Event date must be in the future.")?;
        }
        if let Some(category_id) = update.patch.category {
            self.repository.categories.get_by_id(category_id).await?;
        }
        let event_date = update.patch.event_date.unwrap_or(event.event_date);
        let (state, published_on) = apply_admin_action(&event, update.state_action, event_date, now)?;

        let changes = EventChanges {
            state,
            published_on,
            ..changes_from_patch(&update.patch)
        };
        let updated = self.repository.events.update(event_id, &changes).await?;
        if let Some(state) = state {
            tracing::info!("Event {} moved to {} by an administrator", event_id, state);
        }
        self.full(updated).await
    }

    pub async fn search_admin(
        &self,
        filter: &AdminEventFilter,
        page: Page,
    ) -> AppResult<Vec<EventFull>> {
        let events = self.repository.events.search_admin(filter, page).await?;
        Ok(self
            .enrich(events)
            .await?
            .into_iter()
            .map(|(event, counters)| EventFull::new(event, counters))
            .collect())
    }

    // =========================================================================
    // Public operations
    // =========================================================================

    pub async fn search_public(
        &self,
        filter: &PublicEventFilter,
        page: Page,
        ip: &str,
    ) -> AppResult<Vec<EventShort>> {
        self.record_hit(EVENTS_URI.to_string(), ip).await;

        let events = self
            .repository
            .events
            .search_public(filter, page, datetime::now())
            .await?;
        let mut enriched = self.enrich(events).await?;
        if filter.only_available {
            retain_available(&mut enriched);
        }

        let mut result: Vec<EventShort> = enriched
            .into_iter()
            .map(|(event, counters)| EventShort::new(event, counters))
            .collect();
        if filter.sort == Some(EventSort::Views) {
            sort_by_views(&mut result);
        }
        Ok(result)
    }

    /// A published event; unpublished events look exactly like missing ones
    pub async fn get_published_event(&self, event_id: i64, ip: &str) -> AppResult<EventFull> {
        let event = self
            .repository
            .events
            .find_by_id(event_id)
            .await?
            .filter(|e| e.state == EventState::Published)
            .ok_or_else(|| {
                AppError::NotFound(format!("Event with id={} was not found", event_id))
            })?;

        self.record_hit(event_uri(event_id), ip).await;
        self.full(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::event::sample_event, services::stats_client::MockStatsClient};

    fn at(s: &str) -> NaiveDateTime {
        datetime::parse(s).unwrap()
    }

    fn short(id: i64, views: i64) -> EventShort {
        EventShort::new(
            sample_event(id, 0, true),
            EventCounters {
                views,
                confirmed_requests: 0,
            },
        )
    }

    #[test]
    fn test_views_window_starts_at_earliest_event() {
        let now = at("2031-01-01 00:00:00");
        let mut early = sample_event(1, 0, true);
        early.event_date = at("2029-06-01 10:00:00");
        let late = sample_event(2, 0, true);

        assert_eq!(
            views_window(&[late.clone(), early], now),
            (at("2029-06-01 10:00:00"), now)
        );

        // future events never push the start past now
        let now = at("2025-01-01 00:00:00");
        assert_eq!(views_window(&[late], now), (now, now));
    }

    #[test]
    fn test_views_by_event_parses_uri_suffix() {
        let stats = vec![
            ViewStats {
                app: "ewm-main-service".into(),
                uri: "/events/3".into(),
                hits: 7,
            },
            ViewStats {
                app: "ewm-main-service".into(),
                uri: "/events".into(),
                hits: 100,
            },
            ViewStats {
                app: "ewm-main-service".into(),
                uri: "/events/abc".into(),
                hits: 1,
            },
        ];
        let views = views_by_event(&stats);
        assert_eq!(views.len(), 1);
        assert_eq!(views[&3], 7);
    }

    #[test]
    fn test_retain_available_drops_full_events() {
        let counters = |confirmed| EventCounters {
            views: 0,
            confirmed_requests: confirmed,
        };
        let mut enriched = vec![
            (sample_event(1, 0, true), counters(50)),
            (sample_event(2, 2, true), counters(2)),
            (sample_event(3, 2, true), counters(1)),
        ];
        retain_available(&mut enriched);
        let ids: Vec<i64> = enriched.iter().map(|(e, _)| e.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_sort_by_views_is_stable_descending() {
        let mut events = vec![short(1, 5), short(2, 9), short(3, 5), short(4, 0)];
        sort_by_views(&mut events);
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_event_date_must_be_far_enough() {
        let now = at("2030-01-01 10:00:00");
        let two_hours = Duration::hours(2);
        assert!(check_event_date(at("2030-01-01 12:00:00"), now, two_hours, "too early").is_ok());
        match check_event_date(at("2030-01-01 11:59:59"), now, two_hours, "too early") {
            Err(AppError::Conflict(msg)) => assert!(msg.starts_with("too early")),
            other => panic!("expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_user_action_on_published_event_conflicts() {
        let event = sample_event(1, 0, true);
        assert!(matches!(
            apply_user_action(&event, Some(UserStateAction::CancelReview)),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_user_actions() {
        let mut event = sample_event(1, 0, true);
        event.state = EventState::Canceled;
        assert_eq!(
            apply_user_action(&event, Some(UserStateAction::SendToReview)).unwrap(),
            Some(EventState::Pending)
        );
        event.state = EventState::Pending;
        assert_eq!(
            apply_user_action(&event, Some(UserStateAction::CancelReview)).unwrap(),
            Some(EventState::Canceled)
        );
        assert_eq!(apply_user_action(&event, None).unwrap(), None);
    }

    #[test]
    fn test_publish_requires_pending_and_lead_time() {
        let now = at("2030-01-01 10:00:00");
        let mut event = sample_event(1, 0, true);
        event.state = EventState::Pending;

        let (state, published_on) = apply_admin_action(
            &event,
            Some(AdminStateAction::PublishEvent),
            at("2030-01-01 11:00:00"),
            now,
        )
        .unwrap();
        assert_eq!(state, Some(EventState::Published));
        assert_eq!(published_on, Some(now));

        assert!(apply_admin_action(
            &event,
            Some(AdminStateAction::PublishEvent),
            at("2030-01-01 10:59:59"),
            now,
        )
        .is_err());

        event.state = EventState::Canceled;
        assert!(apply_admin_action(
            &event,
            Some(AdminStateAction::PublishEvent),
            at("2030-06-01 00:00:00"),
            now,
        )
        .is_err());
    }

    #[test]
    fn test_reject_published_event_conflicts() {
        let now = at("2029-01-01 10:00:00");
        let event = sample_event(1, 0, true);
        assert!(matches!(
            apply_admin_action(&event, Some(AdminStateAction::RejectEvent), event.event_date, now),
            Err(AppError::Conflict(_))
        ));

        let mut pending = event;
        pending.state = EventState::Pending;
        assert_eq!(
            apply_admin_action(&pending, Some(AdminStateAction::RejectEvent), pending.event_date, now)
                .unwrap(),
            (Some(EventState::Canceled), None)
        );
    }

    #[tokio::test]
    async fn test_record_hit_swallows_stats_failure() {
        let mut stats = MockStatsClient::new();
        stats
            .expect_hit()
            .times(1)
            .returning(|_| Err(AppError::Internal("stats down".into())));

        // Lazy pool: nothing connects unless a query runs
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let service = EventsService::new(
            Repository::new(pool),
            Arc::new(stats),
            "ewm-main-service".into(),
        );

        service.record_hit(EVENTS_URI.to_string(), "127.0.0.1").await;
    }

    #[tokio::test]
    async fn test_enrich_empty_batch_skips_stats() {
        let mut stats = MockStatsClient::new();
        stats.expect_get_stats().times(0);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let service = EventsService::new(Repository::new(pool), Arc::new(stats), "app".into());

        assert!(service.enrich(Vec::new()).await.unwrap().is_empty());
    }
}
