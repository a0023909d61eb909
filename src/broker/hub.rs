//! Broker loop owning the subscriber registry

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::handle::RegisterRequest;
use super::{BrokerConfig, BrokerHandle, BrokerStats, Publisher, SubscriberId};
use crate::types::Message;

/// The broker task state. Create with [`Broker::new`] and drive with
/// [`Broker::run`], or use [`Broker::spawn`].
pub struct Broker {
    subscribers: BTreeMap<SubscriberId, mpsc::Sender<Message>>,
    next_id: u64,
    subscriber_capacity: usize,
    stats: Arc<BrokerStats>,
    register_rx: mpsc::Receiver<RegisterRequest>,
    deregister_rx: mpsc::UnboundedReceiver<SubscriberId>,
    message_rx: mpsc::Receiver<Message>,
}

impl Broker {
    /// Create the broker together with its handles
    pub fn new(config: BrokerConfig) -> (Self, BrokerHandle, Publisher) {
        let (register_tx, register_rx) = mpsc::channel(32);
        let (deregister_tx, deregister_rx) = mpsc::unbounded_channel();
        let (message_tx, message_rx) = mpsc::channel(config.queue_capacity.max(1));
        let stats = Arc::new(BrokerStats::default());

        let broker = Self {
            subscribers: BTreeMap::new(),
            next_id: 0,
            subscriber_capacity: config.subscriber_capacity.max(1),
            stats: stats.clone(),
            register_rx,
            deregister_rx,
            message_rx,
        };
        let handle = BrokerHandle {
            register_tx,
            deregister_tx,
            stats,
        };

        (broker, handle, Publisher { message_tx })
    }

    /// Create the broker and run it on a new tokio task
    pub fn spawn(config: BrokerConfig) -> (BrokerHandle, Publisher, JoinHandle<()>) {
        let (broker, handle, publisher) = Self::new(config);
        let task = tokio::spawn(broker.run());
        (handle, publisher, task)
    }

    /// Process events one at a time until every publisher is dropped.
    ///
    /// Deregistrations are served first, then pending messages, then
    /// registrations.
    pub async fn run(mut self) {
        info!(capacity = self.subscriber_capacity, "Broker started");

        loop {
            tokio::select! {
                biased;

                Some(id) = self.deregister_rx.recv() => self.remove(id),

                message = self.message_rx.recv() => match message {
                    Some(message) => self.fan_out(message),
                    None => break,
                },

                Some(request) = self.register_rx.recv() => self.add(request),
            }
        }

        let remaining = self.subscribers.len();
        self.subscribers.clear();
        self.stats.set_subscribers(0);
        info!(closed = remaining, "Broker stopped, subscriber sinks closed");
    }

    fn add(&mut self, request: RegisterRequest) {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = mpsc::channel(self.subscriber_capacity);
        self.subscribers.insert(id, tx);
        self.stats.set_subscribers(self.subscribers.len());

        if request.reply.send((id, rx)).is_err() {
            // Requester went away before the reply.
            self.subscribers.remove(&id);
            self.stats.set_subscribers(self.subscribers.len());
            debug!(subscriber = %id, "registration abandoned");
            return;
        }

        info!(subscriber = %id, total = self.subscribers.len(), "Added new client");
    }

    fn remove(&mut self, id: SubscriberId) {
        // Dropping the sender closes the subscriber's sink.
        if self.subscribers.remove(&id).is_some() {
            self.stats.set_subscribers(self.subscribers.len());
            info!(subscriber = %id, total = self.subscribers.len(), "Removed client");
        } else {
            debug!(subscriber = %id, "deregister for unknown client ignored");
        }
    }

    fn fan_out(&mut self, message: Message) {
        self.stats.record_published();

        let mut closed = Vec::new();
        for (id, tx) in &self.subscribers {
            match tx.try_send(message.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.stats.record_dropped();
                    warn!(subscriber = %id, "client queue full, message dropped");
                }
                Err(TrySendError::Closed(_)) => closed.push(*id),
            }
        }
        for id in closed {
            self.remove(id);
        }

        info!("Broadcast message to {} clients", self.subscribers.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::BrokerError;

    fn msg(text: &str) -> Message {
        Message::json(&serde_json::json!({ "text": text })).unwrap()
    }

    #[tokio::test]
    async fn test_subscriber_receives_messages_in_order() {
        let (handle, publisher, _task) = Broker::spawn(BrokerConfig::default());
        let mut sub = handle.register().await.unwrap();

        for i in 0..5 {
            publisher.publish(msg(&i.to_string())).await.unwrap();
        }

        for i in 0..5 {
            assert_eq!(sub.recv().await.unwrap(), msg(&i.to_string()));
        }
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let (handle, publisher, _task) = Broker::spawn(BrokerConfig::default());
        let mut a = handle.register().await.unwrap();
        let mut b = handle.register().await.unwrap();
        assert_ne!(a.id(), b.id());

        publisher.publish(msg("hello")).await.unwrap();

        assert_eq!(a.recv().await.unwrap(), msg("hello"));
        assert_eq!(b.recv().await.unwrap(), msg("hello"));
    }

    #[tokio::test]
    async fn test_deregister_closes_sink() {
        let (handle, publisher, _task) = Broker::spawn(BrokerConfig::default());
        let mut sub = handle.register().await.unwrap();
        let mut other = handle.register().await.unwrap();

        publisher.publish(msg("before")).await.unwrap();
        assert_eq!(sub.recv().await.unwrap(), msg("before"));

        handle.deregister(sub.id());
        publisher.publish(msg("after")).await.unwrap();
        assert!(sub.recv().await.is_none());

        assert_eq!(other.recv().await.unwrap(), msg("before"));
        assert_eq!(other.recv().await.unwrap(), msg("after"));
        assert_eq!(handle.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_dropping_subscription_deregisters() {
        let (handle, publisher, _task) = Broker::spawn(BrokerConfig::default());
        let sub = handle.register().await.unwrap();
        let mut other = handle.register().await.unwrap();
        assert_eq!(handle.subscriber_count(), 2);

        drop(sub);
        publisher.publish(msg("x")).await.unwrap();
        other.recv().await.unwrap();

        assert_eq!(handle.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_messages() {
        let (handle, publisher, _task) = Broker::spawn(BrokerConfig::default());
        let mut early = handle.register().await.unwrap();

        publisher.publish(msg("first")).await.unwrap();
        let mut late = handle.register().await.unwrap();
        publisher.publish(msg("second")).await.unwrap();

        assert_eq!(early.recv().await.unwrap(), msg("first"));
        assert_eq!(early.recv().await.unwrap(), msg("second"));
        assert_eq!(late.recv().await.unwrap(), msg("second"));
    }

    #[tokio::test]
    async fn test_slow_subscriber_drops_without_stalling_others() {
        let config = BrokerConfig::default().with_subscriber_capacity(2);
        let (handle, publisher, _task) = Broker::spawn(config);
        let mut slow = handle.register().await.unwrap();
        let mut fast = handle.register().await.unwrap();

        for i in 0..4 {
            publisher.publish(msg(&i.to_string())).await.unwrap();
            assert_eq!(fast.recv().await.unwrap(), msg(&i.to_string()));
        }

        // Slow client kept the oldest two, the rest were dropped.
        assert_eq!(slow.recv().await.unwrap(), msg("0"));
        assert_eq!(slow.recv().await.unwrap(), msg("1"));
        assert!(slow.try_recv().is_err());

        let stats = handle.stats().snapshot();
        assert_eq!(stats.published, 4);
        assert_eq!(stats.dropped, 2);
    }

    #[tokio::test]
    async fn test_broker_stops_when_publishers_dropped() {
        let (handle, publisher, task) = Broker::spawn(BrokerConfig::default());
        let mut sub = handle.register().await.unwrap();

        drop(publisher);
        task.await.unwrap();

        assert!(sub.recv().await.is_none());
        assert_eq!(handle.register().await.unwrap_err(), BrokerError::Closed);
        assert_eq!(handle.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_after_stop_fails() {
        let (broker, _handle, publisher) = Broker::new(BrokerConfig::default());
        drop(broker);
        assert_eq!(
            publisher.publish(Message::keep_alive()).await,
            Err(BrokerError::Closed)
        );
    }
}
