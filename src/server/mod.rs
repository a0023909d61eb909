//! Event server wiring
//!
//! Starts the broker and poll loop, serves the HTTP API, and tears everything
//! down in order on shutdown:
//!
//! ```text
//! shutdown signal ─► stop poll loop ─► publisher dropped ─► broker closes sinks
//!                                                          ─► SSE streams end ─► serve returns
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::broker::{Broker, BrokerConfig};
use crate::config::ServerConfig;
use crate::poller::PollLoop;
use crate::source::{AccountSource, JsonlSource};

/// The account event server: query API, event stream, poll loop and broker
pub struct EventServer {
    config: ServerConfig,
    source: Arc<dyn AccountSource>,
}

impl EventServer {
    /// Create a server reading accounts from the given source
    pub fn new(config: ServerConfig, source: Arc<dyn AccountSource>) -> Self {
        Self { config, source }
    }

    /// Create a server backed by the configured accounts file
    pub fn from_config(config: ServerConfig) -> Self {
        let source = Arc::new(JsonlSource::new(&config.accounts_file));
        Self::new(config, source)
    }

    /// Serve on `listener` until `shutdown` resolves
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let broker_config =
            BrokerConfig::default().with_subscriber_capacity(self.config.subscriber_capacity);
        let (handle, publisher, broker_task) = Broker::spawn(broker_config);

        let (stop_tx, stop_rx) = watch::channel(false);
        let poll = PollLoop::new(self.source.clone(), publisher, self.config.poll.clone());
        let poll_task = tokio::spawn(poll.run(stop_rx));

        let state = Arc::new(AppState::new(self.source, handle));
        let app = create_router(state);

        if let Ok(addr) = listener.local_addr() {
            info!("Event server listening on {}", addr);
        }

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                info!("Shutdown requested, stopping poll loop");
                let _ = stop_tx.send(true);
            })
            .await;

        if let Err(e) = poll_task.await {
            warn!(error = %e, "poll loop task failed");
        }
        if let Err(e) = broker_task.await {
            warn!(error = %e, "broker task failed");
        }
        info!("Event server stopped");

        result
    }
}
