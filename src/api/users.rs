//! User administration endpoints

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
    models::user::{NewUser, User},
};

use super::PageParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UsersQuery {
    /// Only these users; paging is ignored when set
    #[serde(default)]
    pub ids: Vec<i64>,
}

/// List users
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "admin",
    params(UsersQuery, PageParams),
    responses(
        (status = 200, description = "Users", body = Vec<User>)
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    Query(query): Query<UsersQuery>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<Vec<User>>> {
    let users = state.services.users.list(&query.ids, page.page()?).await?;
    Ok(Json(users))
}

/// Register a user
#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "admin",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid user", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    Json(user): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    user.validate()?;
    let created = state.services.users.create(&user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/admin/users/{user_id}",
    tag = "admin",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.users.delete(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
