//! Change-notification broker
//!
//! A single task owns the subscriber registry and serializes three event
//! sources: registrations, deregistrations and outbound messages. Nothing
//! else touches the registry, so no lock guards it.
//!
//! ```text
//!  Publisher ──messages──┐
//!  BrokerHandle ─register─┼──► Broker::run ──try_send──► Subscription (per client)
//!  Subscription ─drop─────┘      (registry)
//! ```
//!
//! ## Delivery
//! - FIFO per subscriber, no ordering across subscribers
//! - Each subscriber has a bounded queue; when it is full the message is
//!   dropped for that subscriber only (drop-newest), others are unaffected
//! - Pending messages are drained before a registration is processed, so a
//!   new subscriber only sees messages published after `register` was called
//! - The loop ends once every `Publisher` is dropped, closing all sinks

mod handle;
mod hub;
mod stats;

pub use handle::{BrokerHandle, Publisher, SubscriberId, Subscription};
pub use hub::Broker;
pub use stats::{BrokerStats, BrokerStatsSnapshot};

use thiserror::Error;

use crate::config::DEFAULT_SUBSCRIBER_CAPACITY;

/// Depth of the shared outbound message queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BrokerError {
    #[error("broker is closed")]
    Closed,
}

/// Broker sizing
#[derive(Debug, Clone, Copy)]
pub struct BrokerConfig {
    /// Messages buffered per subscriber before drops start
    pub subscriber_capacity: usize,
    /// Messages buffered between publishers and the broker loop
    pub queue_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: DEFAULT_SUBSCRIBER_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl BrokerConfig {
    pub fn with_subscriber_capacity(mut self, capacity: usize) -> Self {
        self.subscriber_capacity = capacity.max(1);
        self
    }
}
