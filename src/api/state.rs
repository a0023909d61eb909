//! Shared application state

use std::sync::Arc;

use crate::broker::BrokerHandle;
use crate::source::AccountSource;

/// State shared by the REST and event-stream handlers
pub struct AppState {
    /// Account source backing the query API
    pub source: Arc<dyn AccountSource>,

    /// Registration side of the broker
    pub broker: BrokerHandle,
}

impl AppState {
    pub fn new(source: Arc<dyn AccountSource>, broker: BrokerHandle) -> Self {
        Self { source, broker }
    }
}
