//! Participation request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::AppResult,
    models::request::{ParticipationRequest, StatusUpdateRequest, StatusUpdateResult},
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NewRequestQuery {
    /// Event to participate in
    pub event_id: i64,
}

/// Requests made by a user
#[utoipa::path(
    get,
    path = "/users/{user_id}/requests",
    tag = "requests",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User's requests", body = Vec<ParticipationRequest>),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user_requests(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<ParticipationRequest>>> {
    let requests = state.services.requests.get_user_requests(user_id).await?;
    Ok(Json(requests))
}

/// Ask to participate in an event
#[utoipa::path(
    post,
    path = "/users/{user_id}/requests",
    tag = "requests",
    params(("user_id" = i64, Path, description = "User ID"), NewRequestQuery),
    responses(
        (status = 201, description = "Request created", body = ParticipationRequest),
        (status = 404, description = "User or event not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Repeat request, own event, unpublished event or full event", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<NewRequestQuery>,
) -> AppResult<(StatusCode, Json<ParticipationRequest>)> {
    let request = state
        .services
        .requests
        .create_request(user_id, query.event_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Cancel one's own request
#[utoipa::path(
    patch,
    path = "/users/{user_id}/requests/{request_id}/cancel",
    tag = "requests",
    params(
        ("user_id" = i64, Path, description = "User ID"),
        ("request_id" = i64, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request canceled", body = ParticipationRequest),
        (status = 404, description = "User or request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Not the requester", body = crate::error::ErrorResponse)
    )
)]
pub async fn cancel_request(
    State(state): State<crate::AppState>,
    Path((user_id, request_id)): Path<(i64, i64)>,
) -> AppResult<Json<ParticipationRequest>> {
    let request = state.services.requests.cancel_request(user_id, request_id).await?;
    Ok(Json(request))
}

/// Requests made for one of the user's events
#[utoipa::path(
    get,
    path = "/users/{user_id}/events/{event_id}/requests",
    tag = "requests",
    params(
        ("user_id" = i64, Path, description = "Initiator ID"),
        ("event_id" = i64, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event's requests", body = Vec<ParticipationRequest>),
        (status = 409, description = "Not the initiator", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_event_participants(
    State(state): State<crate::AppState>,
    Path((user_id, event_id)): Path<(i64, i64)>,
) -> AppResult<Json<Vec<ParticipationRequest>>> {
    let requests = state
        .services
        .requests
        .get_event_participants(user_id, event_id)
        .await?;
    Ok(Json(requests))
}

/// Confirm or reject pending requests of an event
#[utoipa::path(
    patch,
    path = "/users/{user_id}/events/{event_id}/requests",
    tag = "requests",
    params(
        ("user_id" = i64, Path, description = "Initiator ID"),
        ("event_id" = i64, Path, description = "Event ID")
    ),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Requests whose status changed", body = StatusUpdateResult),
        (status = 404, description = "Event or request not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Limit reached, request not pending or not the initiator", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_request_status(
    State(state): State<crate::AppState>,
    Path((user_id, event_id)): Path<(i64, i64)>,
    Json(update): Json<StatusUpdateRequest>,
) -> AppResult<Json<StatusUpdateResult>> {
    let result = state
        .services
        .requests
        .change_request_status(user_id, event_id, &update)
        .await?;
    Ok(Json(result))
}
