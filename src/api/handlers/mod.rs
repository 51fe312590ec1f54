//! REST endpoint handlers organized by resource.

pub mod collections;
pub mod connection;
pub mod subscriptions;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(system::api_routes())
        .merge(collections::routes())
        .merge(subscriptions::routes())
        .merge(connection::routes())
}
