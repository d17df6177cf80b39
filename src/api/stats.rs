//! Hit recording and view statistics endpoints

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::Query;
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    error::AppResult,
    models::hit::{EndpointHit, NewHit, StatsRequest, ViewStats},
};

use super::parse_datetime_param;

/// Query parameters of GET /stats
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Window start, `yyyy-MM-dd HH:mm:ss`
    pub start: String,
    /// Window end, `yyyy-MM-dd HH:mm:ss`
    pub end: String,
    /// Restrict to these uris (repeatable)
    #[serde(default)]
    pub uris: Vec<String>,
    /// Count each IP once
    #[serde(default)]
    pub unique: bool,
}

impl StatsQuery {
    fn into_request(self) -> AppResult<StatsRequest> {
        Ok(StatsRequest {
            start: parse_datetime_param("start", &self.start)?,
            end: parse_datetime_param("end", &self.end)?,
            uris: self.uris,
            unique: self.unique,
        })
    }
}

/// Record a hit on an endpoint
#[utoipa::path(
    post,
    path = "/hit",
    tag = "stats",
    request_body = NewHit,
    responses(
        (status = 201, description = "Hit recorded", body = EndpointHit),
        (status = 400, description = "Invalid hit", body = crate::error::ErrorResponse)
    )
)]
pub async fn record_hit(
    State(state): State<crate::AppState>,
    Json(hit): Json<NewHit>,
) -> AppResult<(StatusCode, Json<EndpointHit>)> {
    hit.validate()?;
    let saved = state.services.stats.record_hit(&hit).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Hit counts per (app, uri), most viewed first
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Aggregated hits", body = Vec<ViewStats>),
        (status = 400, description = "Malformed or inverted range", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<Vec<ViewStats>>> {
    let request = query.into_request()?;
    let stats = state.services.stats.get_stats(&request).await?;
    Ok(Json(stats))
}
