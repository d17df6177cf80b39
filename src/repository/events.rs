//! Events repository

use chrono::NaiveDateTime;
use sqlx::{PgConnection, Pool, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{EventSort, EventState},
        event::{AdminEventFilter, Event, Location, NewEvent, Page, PublicEventFilter},
    },
};

/// Event columns joined with category and initiator names
const EVENT_SELECT: &str = r#"
    SELECT e.id, e.title, e.annotation, e.description,
           e.category_id, c.name AS category_name,
           e.initiator_id, u.name AS initiator_name,
           e.event_date, e.lat, e.lon, e.paid, e.participant_limit,
           e.request_moderation, e.state, e.created_on, e.published_on
    FROM events e
    JOIN categories c ON c.id = e.category_id
    JOIN users u ON u.id = e.initiator_id
"#;

/// Column values to write on update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub annotation: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub event_date: Option<NaiveDateTime>,
    pub location: Option<Location>,
    pub paid: Option<bool>,
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
    pub state: Option<EventState>,
    pub published_on: Option<NaiveDateTime>,
}

impl EventChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.annotation.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.event_date.is_none()
            && self.location.is_none()
            && self.paid.is_none()
            && self.participant_limit.is_none()
            && self.request_moderation.is_none()
            && self.state.is_none()
            && self.published_on.is_none()
    }
}

/// Appends the administrator search predicates present in `filter`
pub(crate) fn push_admin_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AdminEventFilter) {
    qb.push(" WHERE 1=1");

    if !filter.users.is_empty() {
        qb.push(" AND e.initiator_id = ANY(")
            .push_bind(filter.users.clone())
            .push(")");
    }
    if !filter.states.is_empty() {
        let states: Vec<String> = filter.states.iter().map(|s| s.as_str().to_string()).collect();
        qb.push(" AND e.state = ANY(").push_bind(states).push(")");
    }
    if !filter.categories.is_empty() {
        qb.push(" AND e.category_id = ANY(")
            .push_bind(filter.categories.clone())
            .push(")");
    }
    if let Some(start) = filter.range_start {
        qb.push(" AND e.event_date >= ").push_bind(start);
    }
    if let Some(end) = filter.range_end {
        qb.push(" AND e.event_date <= ").push_bind(end);
    }
}

/// Appends the public search predicates; published events only, and
/// upcoming events only when no date range is given.
pub(crate) fn push_public_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &PublicEventFilter,
    now: NaiveDateTime,
) {
    qb.push(" WHERE e.state = ")
        .push_bind(EventState::Published.as_str());

    if let Some(text) = filter.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let needle = text.to_lowercase();
        qb.push(" AND (POSITION(")
            .push_bind(needle.clone())
            .push(" IN LOWER(e.annotation)) > 0 OR POSITION(")
            .push_bind(needle)
            .push(" IN LOWER(e.description)) > 0)");
    }
    if !filter.categories.is_empty() {
        qb.push(" AND e.category_id = ANY(")
            .push_bind(filter.categories.clone())
            .push(")");
    }
    if let Some(paid) = filter.paid {
        qb.push(" AND e.paid = ").push_bind(paid);
    }
    if let Some(start) = filter.range_start {
        qb.push(" AND e.event_date >= ").push_bind(start);
    }
    if let Some(end) = filter.range_end {
        qb.push(" AND e.event_date <= ").push_bind(end);
    }
    if filter.range_start.is_none() && filter.range_end.is_none() {
        qb.push(" AND e.event_date > ").push_bind(now);
    }
    if filter.only_available {
        qb.push(
            " AND (e.participant_limit = 0 OR e.participant_limit > (\
             SELECT COUNT(*) FROM participation_requests r \
             WHERE r.event_id = e.id AND r.status = 'CONFIRMED'))",
        );
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Page) {
    qb.push(" LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());
}

#[derive(Clone)]
pub struct EventsRepository {
    pool: Pool<Postgres>,
}

impl EventsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get event by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Event> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event with id={} was not found", id)))
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Event>> {
        let query = format!("{} WHERE e.id = $1", EVENT_SELECT);
        let event = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    /// Load an event and lock its row until the surrounding transaction ends.
    ///
    /// Every capacity-sensitive write on an event's requests takes this lock
    /// first, so two callers can never both observe a free slot.
    pub async fn lock_by_id(&self, conn: &mut PgConnection, id: i64) -> AppResult<Event> {
        let query = format!("{} WHERE e.id = $1 FOR UPDATE OF e", EVENT_SELECT);
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Event with id={} was not found", id)))
    }

    /// Events with the given ids, in no particular order
    pub async fn list_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Event>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("{} WHERE e.id = ANY($1) ORDER BY e.id", EVENT_SELECT);
        let events = sqlx::query_as::<_, Event>(&query)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    /// Events created by a user
    pub async fn list_by_initiator(&self, initiator_id: i64, page: Page) -> AppResult<Vec<Event>> {
        let query = format!(
            "{} WHERE e.initiator_id = $1 ORDER BY e.id LIMIT $2 OFFSET $3",
            EVENT_SELECT
        );
        let events = sqlx::query_as::<_, Event>(&query)
            .bind(initiator_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    /// Administrator search over all states
    pub async fn search_admin(&self, filter: &AdminEventFilter, page: Page) -> AppResult<Vec<Event>> {
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_admin_filter(&mut qb, filter);
        qb.push(" ORDER BY e.event_date, e.id");
        push_page(&mut qb, page);

        let events = qb.build_query_as::<Event>().fetch_all(&self.pool).await?;
        Ok(events)
    }

    /// Public search over published events
    pub async fn search_public(
        &self,
        filter: &PublicEventFilter,
        page: Page,
        now: NaiveDateTime,
    ) -> AppResult<Vec<Event>> {
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_public_filter(&mut qb, filter, now);
        match filter.sort {
            Some(EventSort::EventDate) => qb.push(" ORDER BY e.event_date, e.id"),
            _ => qb.push(" ORDER BY e.id"),
        };
        push_page(&mut qb, page);

        let events = qb.build_query_as::<Event>().fetch_all(&self.pool).await?;
        Ok(events)
    }

    /// Create an event in PENDING state
    pub async fn create(
        &self,
        initiator_id: i64,
        data: &NewEvent,
        created_on: NaiveDateTime,
    ) -> AppResult<Event> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (
                title, annotation, description, category_id, initiator_id,
                event_date, lat, lon, paid, participant_limit,
                request_moderation, state, created_on
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id
            "#,
        )
        .bind(&data.title)
        .bind(&data.annotation)
        .bind(&data.description)
        .bind(data.category)
        .bind(initiator_id)
        .bind(data.event_date)
        .bind(data.location.lat)
        .bind(data.location.lon)
        .bind(data.paid)
        .bind(data.participant_limit)
        .bind(data.request_moderation)
        .bind(EventState::Pending)
        .bind(created_on)
        .fetch_one(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Apply the present changes and return the updated event
    pub async fn update(&self, id: i64, changes: &EventChanges) -> AppResult<Event> {
        if changes.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE events SET ");
        let mut sets = qb.separated(", ");

        macro_rules! set_f {
            ($field:expr, $column:literal) => {
                if let Some(ref val) = $field {
                    sets.push(concat!($column, " = ")).push_bind_unseparated(val.clone());
                }
            };
        }

        set_f!(changes.title, "title");
        set_f!(changes.annotation, "annotation");
        set_f!(changes.description, "description");
        set_f!(changes.category_id, "category_id");
        set_f!(changes.event_date, "event_date");
        if let Some(location) = changes.location {
            sets.push("lat = ").push_bind_unseparated(location.lat);
            sets.push("lon = ").push_bind_unseparated(location.lon);
        }
        set_f!(changes.paid, "paid");
        set_f!(changes.participant_limit, "participant_limit");
        set_f!(changes.request_moderation, "request_moderation");
        set_f!(changes.state, "state");
        set_f!(changes.published_on, "published_on");

        qb.push(" WHERE id = ").push_bind(id);
        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Event with id={} was not found", id)));
        }

        self.get_by_id(id).await
    }

    /// Whether any event references the category
    pub async fn exists_by_category(&self, category_id: i64) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE category_id = $1)")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    /// Ids among `ids` that do not match an existing event
    pub async fn missing_ids(&self, ids: &[i64]) -> AppResult<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let missing: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT wanted.id
            FROM UNNEST($1::bigint[]) AS wanted(id)
            WHERE NOT EXISTS (SELECT 1 FROM events e WHERE e.id = wanted.id)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    fn where_clause(qb: &QueryBuilder<'_, Postgres>) -> String {
        let sql = qb.sql();
        sql[sql.find(" WHERE").unwrap()..].to_string()
    }

    #[test]
    fn test_admin_filter_empty_has_no_restriction() {
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_admin_filter(&mut qb, &AdminEventFilter::default());
        assert_eq!(where_clause(&qb), " WHERE 1=1");
    }

    #[test]
    fn test_admin_filter_conjoins_present_fields() {
        let filter = AdminEventFilter {
            users: vec![1, 2],
            states: vec![EventState::Pending],
            categories: vec![],
            range_start: Some(at(2024, 1, 1)),
            range_end: None,
        };
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_admin_filter(&mut qb, &filter);
        assert_eq!(
            where_clause(&qb),
            " WHERE 1=1 AND e.initiator_id = ANY($1) AND e.state = ANY($2) AND e.event_date >= $3"
        );
    }

    #[test]
    fn test_public_filter_defaults_to_upcoming() {
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_public_filter(&mut qb, &PublicEventFilter::default(), at(2024, 6, 1));
        assert_eq!(
            where_clause(&qb),
            " WHERE e.state = $1 AND e.event_date > $2"
        );
    }

    #[test]
    fn test_public_filter_with_range_skips_default_date() {
        let filter = PublicEventFilter {
            range_end: Some(at(2025, 1, 1)),
            paid: Some(true),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_public_filter(&mut qb, &filter, at(2024, 6, 1));
        let clause = where_clause(&qb);
        assert!(clause.contains("e.paid = $2"));
        assert!(clause.contains("e.event_date <= $3"));
        assert!(!clause.contains("e.event_date >"));
    }

    #[test]
    fn test_public_filter_text_matches_annotation_or_description() {
        let filter = PublicEventFilter {
            text: Some("  Jazz ".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_public_filter(&mut qb, &filter, at(2024, 6, 1));
        let clause = where_clause(&qb);
        assert!(clause.contains(
            "(POSITION($2 IN LOWER(e.annotation)) > 0 OR POSITION($3 IN LOWER(e.description)) > 0)"
        ));
    }

    #[test]
    fn test_public_filter_blank_text_ignored() {
        let filter = PublicEventFilter {
            text: Some("   ".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_public_filter(&mut qb, &filter, at(2024, 6, 1));
        assert!(!where_clause(&qb).contains("POSITION"));
    }

    #[test]
    fn test_public_filter_only_available_in_query() {
        let filter = PublicEventFilter {
            only_available: true,
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new(EVENT_SELECT);
        push_public_filter(&mut qb, &filter, at(2024, 6, 1));
        assert!(where_clause(&qb).contains("e.participant_limit = 0 OR e.participant_limit > ("));
    }

    #[test]
    fn test_changes_is_empty() {
        assert!(EventChanges::default().is_empty());
        let changes = EventChanges {
            paid: Some(true),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
