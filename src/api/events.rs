//! Event endpoints: public search, initiator management, administration

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::Query;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        enums::{EventSort, EventState},
        event::{AdminEventFilter, EventFull, EventShort, NewEvent, PublicEventFilter, UpdateEventAdmin, UpdateEventUser},
    },
    services::stats::validate_range,
};

use super::{parse_optional_datetime_param, ClientIp, PageParams};

/// Public search parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PublicEventsQuery {
    /// Case-insensitive text searched in annotation and description
    pub text: Option<String>,
    #[serde(default)]
    pub categories: Vec<i64>,
    pub paid: Option<bool>,
    pub range_start: Option<String>,
    pub range_end: Option<String>,
    /// Only events with a free participant slot
    #[serde(default)]
    pub only_available: bool,
    pub sort: Option<EventSort>,
}

impl PublicEventsQuery {
    fn into_filter(self) -> AppResult<PublicEventFilter> {
        let range_start = parse_optional_datetime_param("rangeStart", self.range_start.as_deref())?;
        let range_end = parse_optional_datetime_param("rangeEnd", self.range_end.as_deref())?;
        if let (Some(start), Some(end)) = (range_start, range_end) {
            validate_range(start, end)?;
        }
        Ok(PublicEventFilter {
            text: self.text,
            categories: self.categories,
            paid: self.paid,
            range_start,
            range_end,
            only_available: self.only_available,
            sort: self.sort,
        })
    }
}

/// Administrator search parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AdminEventsQuery {
    /// Initiator ids
    #[serde(default)]
    pub users: Vec<i64>,
    #[serde(default)]
    pub states: Vec<EventState>,
    #[serde(default)]
    pub categories: Vec<i64>,
    pub range_start: Option<String>,
    pub range_end: Option<String>,
}

impl AdminEventsQuery {
    fn into_filter(self) -> AppResult<AdminEventFilter> {
        Ok(AdminEventFilter {
            users: self.users,
            states: self.states,
            categories: self.categories,
            range_start: parse_optional_datetime_param("rangeStart", self.range_start.as_deref())?,
            range_end: parse_optional_datetime_param("rangeEnd", self.range_end.as_deref())?,
        })
    }
}

// =============================================================================
// Public
// =============================================================================

/// Search published events
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    params(PublicEventsQuery, PageParams),
    responses(
        (status = 200, description = "Matching published events", body = Vec<EventShort>),
        (status = 400, description = "Invalid parameters", body = crate::error::ErrorResponse)
    )
)]
pub async fn search_events(
    State(state): State<crate::AppState>,
    ClientIp(ip): ClientIp,
    Query(query): Query<PublicEventsQuery>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<Vec<EventShort>>> {
    let page = page.page()?;
    let filter = query.into_filter()?;
    let events = state.services.events.search_public(&filter, page, &ip).await?;
    Ok(Json(events))
}

/// Get a published event
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "events",
    params(("id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventFull),
        (status = 404, description = "Event not found or not published", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_event(
    State(state): State<crate::AppState>,
    ClientIp(ip): ClientIp,
    Path(id): Path<i64>,
) -> AppResult<Json<EventFull>> {
    let event = state.services.events.get_published_event(id, &ip).await?;
    Ok(Json(event))
}

// =============================================================================
// Initiator
// =============================================================================

/// Events created by a user
#[utoipa::path(
    get,
    path = "/users/{user_id}/events",
    tag = "events",
    params(("user_id" = i64, Path, description = "User ID"), PageParams),
    responses(
        (status = 200, description = "User's events", body = Vec<EventShort>),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_events(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i64>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<Vec<EventShort>>> {
    let events = state.services.events.get_user_events(user_id, page.page()?).await?;
    Ok(Json(events))
}

/// Create an event, pending moderation
#[utoipa::path(
    post,
    path = "/users/{user_id}/events",
    tag = "events",
    params(("user_id" = i64, Path, description = "User ID")),
    request_body = NewEvent,
    responses(
        (status = 201, description = "Event created", body = EventFull),
        (status = 400, description = "Invalid event", body = crate::error::ErrorResponse),
        (status = 404, description = "User or category not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Event date too close", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_event(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i64>,
    Json(event): Json<NewEvent>,
) -> AppResult<(StatusCode, Json<EventFull>)> {
    event.validate()?;
    let created = state.services.events.create_event(user_id, &event).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// One event of its initiator
#[utoipa::path(
    get,
    path = "/users/{user_id}/events/{event_id}",
    tag = "events",
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("event_id" = i64, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event details", body = EventFull),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_event(
    State(state): State<crate::AppState>,
    Path((user_id, event_id)): Path<(i64, i64)>,
) -> AppResult<Json<EventFull>> {
    let event = state.services.events.get_user_event(user_id, event_id).await?;
    Ok(Json(event))
}

/// Edit an unpublished event
#[utoipa::path(
    patch,
    path = "/users/{user_id}/events/{event_id}",
    tag = "events",
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("event_id" = i64, Path, description = "Event ID")
    ),
    request_body = UpdateEventUser,
    responses(
        (status = 200, description = "Event updated", body = EventFull),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Event published or not owned", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user_event(
    State(state): State<crate::AppState>,
    Path((user_id, event_id)): Path<(i64, i64)>,
    Json(update): Json<UpdateEventUser>,
) -> AppResult<Json<EventFull>> {
    update.validate()?;
    let event = state
        .services
        .events
        .update_by_initiator(user_id, event_id, &update)
        .await?;
    Ok(Json(event))
}

// =============================================================================
// Administration
// =============================================================================

/// Search events in any state
#[utoipa::path(
    get,
    path = "/admin/events",
    tag = "admin",
    params(AdminEventsQuery, PageParams),
    responses(
        (status = 200, description = "Matching events", body = Vec<EventFull>)
    )
)]
pub async fn admin_search_events(
    State(state): State<crate::AppState>,
    Query(query): Query<AdminEventsQuery>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<Vec<EventFull>>> {
    let page = page.page()?;
    let events = state.services.events.search_admin(&query.into_filter()?, page).await?;
    Ok(Json(events))
}

/// Edit, publish or reject an event
#[utoipa::path(
    patch,
    path = "/admin/events/{event_id}",
    tag = "admin",
    params(("event_id" = i64, Path, description = "Event ID")),
    request_body = UpdateEventAdmin,
    responses(
        (status = 200, description = "Event updated", body = EventFull),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn admin_update_event(
    State(state): State<crate::AppState>,
    Path(event_id): Path<i64>,
    Json(update): Json<UpdateEventAdmin>,
) -> AppResult<Json<EventFull>> {
    update.validate()?;
    let event = state.services.events.update_by_admin(event_id, &update).await?;
    Ok(Json(event))
}
