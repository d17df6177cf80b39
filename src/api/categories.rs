//! Category endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::category::{Category, CategoryName},
};

use super::PageParams;

/// List categories
#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    params(PageParams),
    responses(
        (status = 200, description = "Categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<Vec<Category>>> {
    let categories = state.services.categories.list(page.page()?).await?;
    Ok(Json(categories))
}

/// Get a category
#[utoipa::path(
    get,
    path = "/categories/{cat_id}",
    tag = "categories",
    params(("cat_id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_category(
    State(state): State<crate::AppState>,
    Path(cat_id): Path<i64>,
) -> AppResult<Json<Category>> {
    Ok(Json(state.services.categories.get(cat_id).await?))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/admin/categories",
    tag = "admin",
    request_body = CategoryName,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 409, description = "Name already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_category(
    State(state): State<crate::AppState>,
    Json(body): Json<CategoryName>,
) -> AppResult<(StatusCode, Json<Category>)> {
    body.validate()?;
    let category = state.services.categories.create(&body.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename a category
#[utoipa::path(
    patch,
    path = "/admin/categories/{cat_id}",
    tag = "admin",
    params(("cat_id" = i64, Path, description = "Category ID")),
    request_body = CategoryName,
    responses(
        (status = 200, description = "Category renamed", body = Category),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Name already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_category(
    State(state): State<crate::AppState>,
    Path(cat_id): Path<i64>,
    Json(body): Json<CategoryName>,
) -> AppResult<Json<Category>> {
    body.validate()?;
    Ok(Json(state.services.categories.rename(cat_id, &body.name).await?))
}

/// Delete an unused category
#[utoipa::path(
    delete,
    path = "/admin/categories/{cat_id}",
    tag = "admin",
    params(("cat_id" = i64, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Category still used by events", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_category(
    State(state): State<crate::AppState>,
    Path(cat_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.categories.delete(cat_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
