//! Event compilations (curated, optionally pinned, event lists)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::event::EventShort;

#[derive(Debug, Clone, FromRow)]
pub struct CompilationRow {
    pub id: i64,
    pub title: String,
    pub pinned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Compilation {
    pub id: i64,
    pub title: String,
    pub pinned: bool,
    pub events: Vec<EventShort>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewCompilation {
    #[serde(default)]
    pub events: Vec<i64>,
    #[serde(default)]
    pub pinned: bool,
    #[validate(length(min = 1, max = 50))]
    pub title: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCompilation {
    pub events: Option<Vec<i64>>,
    pub pinned: Option<bool>,
    #[validate(length(min = 1, max = 50))]
    pub title: Option<String>,
}
