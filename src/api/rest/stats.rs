//! Broker statistics endpoint

use std::sync::Arc;

use axum::{extract::State, Json};

use super::ApiResponse;
use crate::api::state::AppState;
use crate::broker::BrokerStatsSnapshot;

/// GET /api/stats - Subscriber count and message counters
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<BrokerStatsSnapshot>> {
    Json(ApiResponse::new(state.broker.stats().snapshot()))
}
