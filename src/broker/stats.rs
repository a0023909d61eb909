//! Broker counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

/// Counters written by the broker loop and read by anyone holding a handle
#[derive(Debug, Default)]
pub struct BrokerStats {
    subscribers: AtomicUsize,
    published: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`BrokerStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BrokerStatsSnapshot {
    pub subscribers: usize,
    pub published: u64,
    pub dropped: u64,
}

impl BrokerStats {
    pub(crate) fn set_subscribers(&self, count: usize) {
        self.subscribers.store(count, Ordering::SeqCst);
    }

    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }

    pub fn subscribers(&self) -> usize {
        self.subscribers.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> BrokerStatsSnapshot {
        BrokerStatsSnapshot {
            subscribers: self.subscribers.load(Ordering::SeqCst),
            published: self.published.load(Ordering::SeqCst),
            dropped: self.dropped.load(Ordering::SeqCst),
        }
    }
}
