//! Explore Events
//!
//! Event sharing platform: events and their categories, participation
//! requests under a per-event capacity limit, comments, compilations, and a
//! view statistics component fed by endpoint hits.

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Statistics
        .route("/hit", post(api::stats::record_hit))
        .route("/stats", get(api::stats::get_stats))
        // Public
        .route("/events", get(api::events::search_events))
        .route("/events/:id", get(api::events::get_event))
        .route("/events/:id/comments", get(api::comments::list_comments))
        .route("/categories", get(api::categories::list_categories))
        .route("/categories/:cat_id", get(api::categories::get_category))
        .route("/compilations", get(api::compilations::list_compilations))
        .route("/compilations/:comp_id", get(api::compilations::get_compilation))
        // Private
        .route(
            "/users/:user_id/events",
            get(api::events::get_user_events).post(api::events::create_event),
        )
        .route(
            "/users/:user_id/events/:event_id",
            get(api::events::get_user_event).patch(api::events::update_user_event),
        )
        .route(
            "/users/:user_id/events/:event_id/requests",
            get(api::requests::get_event_participants).patch(api::requests::change_request_status),
        )
        .route(
            "/users/:user_id/events/:event_id/comments",
            post(api::comments::add_comment),
        )
        .route(
            "/users/:user_id/requests",
            get(api::requests::get_user_requests).post(api::requests::create_request),
        )
        .route(
            "/users/:user_id/requests/:request_id/cancel",
            patch(api::requests::cancel_request),
        )
        // Administration
        .route("/admin/events", get(api::events::admin_search_events))
        .route("/admin/events/:event_id", patch(api::events::admin_update_event))
        .route(
            "/admin/users",
            get(api::users::list_users).post(api::users::create_user),
        )
        .route("/admin/users/:user_id", delete(api::users::delete_user))
        .route("/admin/categories", post(api::categories::create_category))
        .route(
            "/admin/categories/:cat_id",
            patch(api::categories::update_category).delete(api::categories::delete_category),
        )
        .route("/admin/compilations", post(api::compilations::create_compilation))
        .route(
            "/admin/compilations/:comp_id",
            patch(api::compilations::update_compilation)
                .delete(api::compilations::delete_compilation),
        )
        .route("/admin/comments/:comment_id", delete(api::comments::delete_comment))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(api::openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn state() -> AppState {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let config = AppConfig {
            server: Default::default(),
            database: Default::default(),
            logging: Default::default(),
            stats: Default::default(),
        };
        let services = services::Services::new(repository::Repository::new(pool), &config.stats);
        AppState {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = create_router(state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_negative_from_is_bad_request() {
        let response = create_router(state())
            .oneshot(Request::get("/events?from=-1").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_inverted_stats_range_is_bad_request() {
        let response = create_router(state())
            .oneshot(
                Request::get("/stats?start=2024-02-01%2000:00:00&end=2024-01-01%2000:00:00")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
