//! Account Events
//!
//! Account query API plus a change-notification broker that streams account
//! updates to browsers over Server-Sent Events.
//!
//! # Features
//!
//! - **Polling change detection**: top-N accounts sampled on a fixed interval
//!   and diffed against the last observed state
//! - **Single-owner broker**: one task owns the subscriber registry
//! - **Bounded fan-out**: slow clients drop messages instead of stalling others
//! - **Keep-alive**: `{}` broadcast after 10 seconds without changes
//! - **Graceful shutdown**: poll loop, broker and open streams close in order
//!
//! # Modules
//!
//! - `types`: Account model, change rule and broadcast message
//! - `source`: Account sources (in-memory, JSONL file)
//! - `poller`: Change detector and poll loop
//! - `broker`: Subscriber registry and fan-out
//! - `api`: REST query endpoints and the SSE event stream
//! - `config`: Environment configuration
//! - `server`: Wiring and shutdown
//!
//! # Example
//!
//! ```no_run
//! use account_events::config::ServerConfig;
//! use account_events::server::EventServer;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let config = ServerConfig::default();
//!     let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
//!     EventServer::from_config(config)
//!         .run(listener, async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```

pub mod api;
pub mod broker;
pub mod config;
pub mod poller;
pub mod server;
pub mod source;
pub mod types;

// Re-export commonly used items at crate root
pub use broker::{Broker, BrokerConfig, BrokerHandle, Publisher, Subscription};
pub use config::ServerConfig;
pub use poller::{ChangeDetector, PollLoop};
pub use server::EventServer;
pub use source::{AccountSource, JsonlSource, MemorySource, SourceError};
pub use types::{Account, Balance, Message};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
