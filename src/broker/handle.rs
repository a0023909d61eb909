//! Cloneable handles onto the broker loop

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use super::{BrokerError, BrokerStats};
use crate::types::Message;

/// Identifier assigned to a subscriber at registration, increasing in
/// registration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

pub(crate) struct RegisterRequest {
    pub(crate) reply: oneshot::Sender<(SubscriberId, mpsc::Receiver<Message>)>,
}

/// Handle used by connection endpoints to join and leave the broadcast
#[derive(Clone)]
pub struct BrokerHandle {
    pub(crate) register_tx: mpsc::Sender<RegisterRequest>,
    pub(crate) deregister_tx: mpsc::UnboundedSender<SubscriberId>,
    pub(crate) stats: Arc<BrokerStats>,
}

impl BrokerHandle {
    /// Register a new subscriber.
    ///
    /// Registration is complete when this returns: every message published
    /// afterwards is queued for the returned subscription.
    pub async fn register(&self) -> Result<Subscription, BrokerError> {
        let (reply, response) = oneshot::channel();
        self.register_tx
            .send(RegisterRequest { reply })
            .await
            .map_err(|_| BrokerError::Closed)?;
        let (id, rx) = response.await.map_err(|_| BrokerError::Closed)?;

        Ok(Subscription {
            id,
            rx,
            deregister_tx: self.deregister_tx.clone(),
        })
    }

    /// Ask the broker to drop a subscriber. Never blocks; unknown ids are
    /// ignored by the broker.
    pub fn deregister(&self, id: SubscriberId) {
        let _ = self.deregister_tx.send(id);
    }

    /// Current number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.stats.subscribers()
    }

    pub fn stats(&self) -> &BrokerStats {
        &self.stats
    }
}

/// Handle used by the poll loop to enqueue outbound messages.
///
/// The broker loop stops once every publisher is dropped.
#[derive(Clone)]
pub struct Publisher {
    pub(crate) message_tx: mpsc::Sender<Message>,
}

impl Publisher {
    /// Enqueue a message for every registered subscriber. Waits while the
    /// shared queue is full.
    pub async fn publish(&self, message: Message) -> Result<(), BrokerError> {
        self.message_tx
            .send(message)
            .await
            .map_err(|_| BrokerError::Closed)
    }
}

/// One registered consumer of broadcast messages.
///
/// Dropping the subscription deregisters it, which is how a disconnected
/// HTTP client is cleaned up when its response stream is dropped.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::Receiver<Message>,
    deregister_tx: mpsc::UnboundedSender<SubscriberId>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next message, or `None` once the broker has closed this sink
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`]
    pub fn try_recv(&mut self) -> Result<Message, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // Broker may already be gone; nothing to clean up then.
        let _ = self.deregister_tx.send(self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
