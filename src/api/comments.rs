//! Event comment endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::comment::{Comment, NewComment},
};

/// Comments of an event, newest first
#[utoipa::path(
    get,
    path = "/events/{event_id}/comments",
    tag = "comments",
    params(("event_id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Comments", body = Vec<Comment>),
        (status = 404, description = "Event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_comments(
    State(state): State<crate::AppState>,
    Path(event_id): Path<i64>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.services.comments.list_for_event(event_id).await?))
}

/// Comment on an event
#[utoipa::path(
    post,
    path = "/users/{user_id}/events/{event_id}/comments",
    tag = "comments",
    params(
        ("user_id" = i64, Path, description = "Author ID"),
        ("event_id" = i64, Path, description = "Event ID")
    ),
    request_body = NewComment,
    responses(
        (status = 201, description = "Comment added", body = Comment),
        (status = 400, description = "Blank or too long text", body = crate::error::ErrorResponse),
        (status = 404, description = "User or event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_comment(
    State(state): State<crate::AppState>,
    Path((user_id, event_id)): Path<(i64, i64)>,
    Json(body): Json<NewComment>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    body.validate()?;
    let comment = state.services.comments.add(user_id, event_id, &body).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Remove a comment
#[utoipa::path(
    delete,
    path = "/admin/comments/{comment_id}",
    tag = "admin",
    params(("comment_id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 404, description = "Comment not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_comment(
    State(state): State<crate::AppState>,
    Path(comment_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.comments.delete(comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
