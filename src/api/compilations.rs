//! Compilation endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use validator::Validate;

use crate::{
    error::AppResult,
    models::compilation::{Compilation, NewCompilation, UpdateCompilation},
};

use super::PageParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompilationsQuery {
    /// Only pinned, or only unpinned, compilations
    pub pinned: Option<bool>,
}

/// List compilations
#[utoipa::path(
    get,
    path = "/compilations",
    tag = "compilations",
    params(CompilationsQuery, PageParams),
    responses(
        (status = 200, description = "Compilations", body = Vec<Compilation>)
    )
)]
pub async fn list_compilations(
    State(state): State<crate::AppState>,
    Query(query): Query<CompilationsQuery>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<Vec<Compilation>>> {
    let compilations = state
        .services
        .compilations
        .list(query.pinned, page.page()?)
        .await?;
    Ok(Json(compilations))
}

/// Get a compilation
#[utoipa::path(
    get,
    path = "/compilations/{comp_id}",
    tag = "compilations",
    params(("comp_id" = i64, Path, description = "Compilation ID")),
    responses(
        (status = 200, description = "Compilation", body = Compilation),
        (status = 404, description = "Compilation not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_compilation(
    State(state): State<crate::AppState>,
    Path(comp_id): Path<i64>,
) -> AppResult<Json<Compilation>> {
    Ok(Json(state.services.compilations.get(comp_id).await?))
}

/// Create a compilation
#[utoipa::path(
    post,
    path = "/admin/compilations",
    tag = "admin",
    request_body = NewCompilation,
    responses(
        (status = 201, description = "Compilation created", body = Compilation),
        (status = 404, description = "Unknown event", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_compilation(
    State(state): State<crate::AppState>,
    Json(body): Json<NewCompilation>,
) -> AppResult<(StatusCode, Json<Compilation>)> {
    body.validate()?;
    let compilation = state.services.compilations.create(&body).await?;
    Ok((StatusCode::CREATED, Json(compilation)))
}

/// Update a compilation; a present event list replaces the old one
#[utoipa::path(
    patch,
    path = "/admin/compilations/{comp_id}",
    tag = "admin",
    params(("comp_id" = i64, Path, description = "Compilation ID")),
    request_body = UpdateCompilation,
    responses(
        (status = 200, description = "Compilation updated", body = Compilation),
        (status = 404, description = "Compilation or event not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_compilation(
    State(state): State<crate::AppState>,
    Path(comp_id): Path<i64>,
    Json(body): Json<UpdateCompilation>,
) -> AppResult<Json<Compilation>> {
    body.validate()?;
    Ok(Json(state.services.compilations.update(comp_id, &body).await?))
}

/// Delete a compilation
#[utoipa::path(
    delete,
    path = "/admin/compilations/{comp_id}",
    tag = "admin",
    params(("comp_id" = i64, Path, description = "Compilation ID")),
    responses(
        (status = 204, description = "Compilation deleted"),
        (status = 404, description = "Compilation not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_compilation(
    State(state): State<crate::AppState>,
    Path(comp_id): Path<i64>,
) -> AppResult<StatusCode> {
    state.services.compilations.delete(comp_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
