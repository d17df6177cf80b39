//! Endpoint hit log and aggregated view statistics

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::datetime;

/// Stored hit
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EndpointHit {
    pub id: i64,
    pub app: String,
    pub uri: String,
    pub ip: String,
    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2024-01-01 12:00:00")]
    pub timestamp: NaiveDateTime,
}

/// Hit to record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct NewHit {
    #[validate(length(min = 1, max = 255))]
    pub app: String,
    #[validate(length(min = 1, max = 512))]
    pub uri: String,
    #[validate(length(min = 1, max = 64))]
    pub ip: String,
    #[serde(with = "datetime")]
    #[schema(value_type = String, example = "2024-01-01 12:00:00")]
    pub timestamp: NaiveDateTime,
}

/// Hit count for one (app, uri) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ViewStats {
    pub app: String,
    pub uri: String,
    pub hits: i64,
}

/// Aggregation request over the hit log
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRequest {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Empty means every uri
    pub uris: Vec<String>,
    /// Count distinct caller IPs instead of raw hits
    pub unique: bool,
}
