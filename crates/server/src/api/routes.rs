use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use super::{audit, handlers, middleware::metrics_middleware, tickets, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config().server.cors_origins);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Run log
        .route("/logs", get(audit::query_logs))
        // Tickets
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/{id}", get(tickets::get_ticket))
        .route("/tickets/{id}/process", post(tickets::process_ticket))
        .route("/tickets/{id}/approve-review", post(tickets::approve_review))
        // Live updates
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
