//! Route definitions and router construction.

use crate::handlers;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the gateway router with CORS and request tracing layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/servers", get(handlers::list_servers))
        .route("/servers/register", post(handlers::register))
        .route("/servers/{name}", delete(handlers::unregister))
        .route("/servers/{name}/start", post(handlers::start))
        .route("/servers/{name}/stop", post(handlers::stop))
        .route("/servers/{name}/status", get(handlers::status))
        .route("/call", post(handlers::call))
        .route("/tools/{server}/{tool}", post(handlers::call_tool))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
