//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{categories, comments, compilations, events, health, requests, stats, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Explore Events API",
        version = "1.0.0",
        description = "Event sharing platform and view statistics REST API",
        license(name = "MIT")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Stats
        stats::record_hit,
        stats::get_stats,
        // Events
        events::search_events,
        events::get_event,
        events::get_user_events,
        events::create_event,
        events::get_user_event,
        events::update_user_event,
        events::admin_search_events,
        events::admin_update_event,
        // Requests
        requests::get_user_requests,
        requests::create_request,
        requests::cancel_request,
        requests::get_event_participants,
        requests::change_request_status,
        // Users
        users::list_users,
        users::create_user,
        users::delete_user,
        // Categories
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        // Compilations
        compilations::list_compilations,
        compilations::get_compilation,
        compilations::create_compilation,
        compilations::update_compilation,
        compilations::delete_compilation,
        // Comments
        comments::list_comments,
        comments::add_comment,
        comments::delete_comment,
    ),
    components(
        schemas(
            // Events
            crate::models::event::EventFull,
            crate::models::event::EventShort,
            crate::models::event::NewEvent,
            crate::models::event::EventPatch,
            crate::models::event::UpdateEventUser,
            crate::models::event::UpdateEventAdmin,
            crate::models::event::Location,
            crate::models::enums::EventState,
            crate::models::enums::EventSort,
            crate::models::enums::UserStateAction,
            crate::models::enums::AdminStateAction,
            // Requests
            crate::models::request::ParticipationRequest,
            crate::models::request::StatusUpdateRequest,
            crate::models::request::StatusUpdateResult,
            crate::models::enums::RequestStatus,
            crate::models::enums::RequestDecision,
            // Stats
            crate::models::hit::NewHit,
            crate::models::hit::EndpointHit,
            crate::models::hit::ViewStats,
            // Users
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::NewUser,
            // Categories
            crate::models::category::Category,
            crate::models::category::CategoryName,
            // Compilations
            crate::models::compilation::Compilation,
            crate::models::compilation::NewCompilation,
            crate::models::compilation::UpdateCompilation,
            // Comments
            crate::models::comment::Comment,
            crate::models::comment::NewComment,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "stats", description = "Hit log and view statistics"),
        (name = "events", description = "Public search and initiator event management"),
        (name = "requests", description = "Participation requests"),
        (name = "categories", description = "Event categories"),
        (name = "compilations", description = "Event compilations"),
        (name = "comments", description = "Event comments"),
        (name = "admin", description = "Administration")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
