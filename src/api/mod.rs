//! Diagnostics REST API: route handlers, DTOs, and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health` and the
//! OpenAPI document live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the diagnostics API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "callcenter-sync diagnostics",
        description = "Read-only views of the synchronized call-center state plus connection and subscription control."
    ),
    paths(
        handlers::system::health_handler,
        handlers::system::status_handler,
        handlers::collections::list_calls,
        handlers::collections::get_call,
        handlers::collections::list_agents,
        handlers::collections::get_agent,
        handlers::collections::list_alerts,
        handlers::collections::list_metrics,
        handlers::collections::list_queues,
        handlers::collections::list_campaigns,
        handlers::collections::list_events,
        handlers::subscriptions::list_subscriptions,
        handlers::subscriptions::subscribe,
        handlers::subscriptions::unsubscribe,
        handlers::connection::connect,
        handlers::connection::disconnect,
        handlers::connection::send_message,
    ),
    tags(
        (name = "System", description = "Health and sync status"),
        (name = "Collections", description = "Live collection snapshots and the event log"),
        (name = "Subscriptions", description = "Channel subscriptions"),
        (name = "Connection", description = "Connection control and outbound messages"),
    )
)]
pub struct ApiDoc;

/// Path of the generated OpenAPI JSON document.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(docs_router())
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router<AppState> {
    let swagger =
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi());
    Router::new().merge(swagger)
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router<AppState> {
    use axum::Json;
    use axum::routing::get;

    Router::new().route(OPENAPI_PATH, get(|| async { Json(ApiDoc::openapi()) }))
}
