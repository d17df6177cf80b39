//! Event model, its API representations and search filters

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    category::Category,
    datetime,
    enums::{AdminStateAction, EventSort, EventState, UserStateAction},
    user::UserShort,
};

/// Event row as stored, joined with its category and initiator names.
///
/// Never carries view or confirmed-request counters: those only exist on
/// [`EventFull`] / [`EventShort`], built by the enrichment pass.
#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub description: String,
    pub category_id: i64,
    pub category_name: String,
    pub initiator_id: i64,
    pub initiator_name: String,
    pub event_date: NaiveDateTime,
    pub lat: f32,
    pub lon: f32,
    pub paid: bool,
    pub participant_limit: i32,
    pub request_moderation: bool,
    pub state: EventState,
    pub created_on: NaiveDateTime,
    pub published_on: Option<NaiveDateTime>,
}

impl Event {
    /// Participant limit of 0 means unlimited
    pub fn is_unlimited(&self) -> bool {
        self.participant_limit == 0
    }

    /// Whether confirmations must go through the initiator
    pub fn needs_moderation(&self) -> bool {
        !self.is_unlimited() && self.request_moderation
    }

    pub fn is_full(&self, confirmed: i64) -> bool {
        !self.is_unlimited() && confirmed >= i64::from(self.participant_limit)
    }

    pub fn uri(&self) -> String {
        event_uri(self.id)
    }
}

/// Path under which an event's public page is tracked by view statistics
pub fn event_uri(id: i64) -> String {
    format!("{}{}", EVENT_URI_PREFIX, id)
}

pub const EVENT_URI_PREFIX: &str = "/events/";

/// Computed counters attached to an event at read time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventCounters {
    pub views: i64,
    pub confirmed_requests: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    pub lat: f32,
    pub lon: f32,
}

/// Full event representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventFull {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub category: Category,
    pub description: String,
    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2024-12-31 18:00:00")]
    pub event_date: NaiveDateTime,
    pub location: Location,
    pub paid: bool,
    pub participant_limit: i32,
    pub request_moderation: bool,
    pub initiator: UserShort,
    pub state: EventState,
    #[serde(with = "datetime")]
    #[schema(value_type = String)]
    pub created_on: NaiveDateTime,
    #[serde(with = "datetime::option")]
    #[schema(value_type = Option<String>)]
    pub published_on: Option<NaiveDateTime>,
    pub confirmed_requests: i64,
    pub views: i64,
}

impl EventFull {
    pub fn new(event: Event, counters: EventCounters) -> Self {
        Self {
            id: event.id,
            title: event.title,
            annotation: event.annotation,
            category: Category {
                id: event.category_id,
                name: event.category_name,
            },
            description: event.description,
            event_date: event.event_date,
            location: Location {
                lat: event.lat,
                lon: event.lon,
            },
            paid: event.paid,
            participant_limit: event.participant_limit,
            request_moderation: event.request_moderation,
            initiator: UserShort {
                id: event.initiator_id,
                name: event.initiator_name,
            },
            state: event.state,
            created_on: event.created_on,
            published_on: event.published_on,
            confirmed_requests: counters.confirmed_requests,
            views: counters.views,
        }
    }
}

/// Short event representation used in lists
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventShort {
    pub id: i64,
    pub title: String,
    pub annotation: String,
    pub category: Category,
    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2024-12-31 18:00:00")]
    pub event_date: NaiveDateTime,
    pub initiator: UserShort,
    pub paid: bool,
    pub confirmed_requests: i64,
    pub views: i64,
}

impl EventShort {
    pub fn new(event: Event, counters: EventCounters) -> Self {
        Self {
            id: event.id,
            title: event.title,
            annotation: event.annotation,
            category: Category {
                id: event.category_id,
                name: event.category_name,
            },
            event_date: event.event_date,
            initiator: UserShort {
                id: event.initiator_id,
                name: event.initiator_name,
            },
            paid: event.paid,
            confirmed_requests: counters.confirmed_requests,
            views: counters.views,
        }
    }
}

/// Create event request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[validate(length(min = 20, max = 2000))]
    pub annotation: String,
    pub category: i64,
    #[validate(length(min = 20, max = 7000))]
    pub description: String,
    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2024-12-31 18:00:00")]
    pub event_date: NaiveDateTime,
    pub location: Location,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub participant_limit: i32,
    #[serde(default = "default_true")]
    pub request_moderation: bool,
    #[validate(length(min = 3, max = 120))]
    pub title: String,
}

fn default_true() -> bool {
    true
}

/// Fields both the initiator and an administrator may change
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    #[validate(length(min = 20, max = 2000))]
    pub annotation: Option<String>,
    pub category: Option<i64>,
    #[validate(length(min = 20, max = 7000))]
    pub description: Option<String>,
    #[serde(default, with = "datetime::option")]
    #[schema(value_type = Option<String>)]
    pub event_date: Option<NaiveDateTime>,
    pub location: Option<Location>,
    pub paid: Option<bool>,
    #[validate(range(min = 0))]
    pub participant_limit: Option<i32>,
    pub request_moderation: Option<bool>,
    #[validate(length(min = 3, max = 120))]
    pub title: Option<String>,
}

/// Update event request sent by its initiator
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventUser {
    #[serde(flatten)]
    #[validate(nested)]
    pub patch: EventPatch,
    pub state_action: Option<UserStateAction>,
}

/// Update event request sent by an administrator
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventAdmin {
    #[serde(flatten)]
    #[validate(nested)]
    pub patch: EventPatch,
    pub state_action: Option<AdminStateAction>,
}

/// Offset pagination as `from` (items to skip) and `size` (page length).
///
/// The offset is rounded down to a whole page, so identical `from`/`size`
/// pairs always address the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub from: i64,
    pub size: i64,
}

impl Page {
    pub const DEFAULT_SIZE: i64 = 10;

    pub fn new(from: Option<i64>, size: Option<i64>) -> Result<Self, String> {
        let from = from.unwrap_or(0);
        let size = size.unwrap_or(Self::DEFAULT_SIZE);
        if from < 0 {
            return Err(format!("from must be >= 0, got {}", from));
        }
        if size <= 0 {
            return Err(format!("size must be > 0, got {}", size));
        }
        Ok(Self { from, size })
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.from / self.size) * self.size
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            from: 0,
            size: Self::DEFAULT_SIZE,
        }
    }
}

/// Administrator search; every present field narrows the result
#[derive(Debug, Clone, Default)]
pub struct AdminEventFilter {
    pub users: Vec<i64>,
    pub states: Vec<EventState>,
    pub categories: Vec<i64>,
    pub range_start: Option<NaiveDateTime>,
    pub range_end: Option<NaiveDateTime>,
}

/// Public search; always limited to published events
#[derive(Debug, Clone, Default)]
pub struct PublicEventFilter {
    pub text: Option<String>,
    pub categories: Vec<i64>,
    pub paid: Option<bool>,
    pub range_start: Option<NaiveDateTime>,
    pub range_end: Option<NaiveDateTime>,
    pub only_available: bool,
    pub sort: Option<EventSort>,
}


#[cfg(test)]
pub(crate) use tests::sample_event;
