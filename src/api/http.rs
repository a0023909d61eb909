//! Axum router for the query API and the event stream

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rest::{accounts, stats};
use super::sse::events_handler;
use super::state::AppState;

/// Build the router. Both `/events` and `/events/` serve the stream.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Browsers subscribe from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/accounts", get(accounts::list_top_accounts))
        .route("/accounts/:account_id", get(accounts::get_account))
        .route("/stats", get(stats::get_stats));

    Router::new()
        .route("/events", get(events_handler))
        .route("/events/", get(events_handler))
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
    subscribers: usize,
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        version: crate::VERSION,
        subscribers: state.broker.subscriber_count(),
    })
}
