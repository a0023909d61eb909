//! Poll loop: fetch, diff, publish, keep alive, sleep

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use super::ChangeDetector;
use crate::broker::Publisher;
use crate::config::PollConfig;
use crate::source::AccountSource;
use crate::types::{Account, Message, CHANGE_RULE_VERSION};

/// What happened during one poll cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Accounts returned by the source
    pub fetched: usize,
    /// Changed accounts published
    pub published: usize,
    /// The source call failed and diffing was skipped
    pub fetch_failed: bool,
    /// A keep-alive message was sent at the end of the cycle
    pub keep_alive: bool,
}

/// Samples the source and publishes changed accounts.
///
/// The loop is the only owner of the snapshot set.
pub struct PollLoop {
    source: Arc<dyn AccountSource>,
    publisher: Publisher,
    detector: ChangeDetector,
    config: PollConfig,
    last_message: Instant,
}

impl PollLoop {
    pub fn new(source: Arc<dyn AccountSource>, publisher: Publisher, config: PollConfig) -> Self {
        Self {
            source,
            publisher,
            detector: ChangeDetector::new(),
            config,
            last_message: Instant::now(),
        }
    }

    pub fn detector(&self) -> &ChangeDetector {
        &self.detector
    }

    /// Run cycles until `shutdown` turns true (or its sender is dropped)
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            poll_ms = self.config.poll_interval.as_millis() as u64,
            batch = self.config.batch_size,
            change_rule = CHANGE_RULE_VERSION,
            "Poll loop started"
        );

        while !*shutdown.borrow() {
            self.run_cycle().await;

            tokio::select! {
                _ = sleep(self.config.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Poll loop stopped");
    }

    /// One FETCHING → DIFFING → PUBLISHING → keep-alive pass, without the
    /// trailing sleep
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        debug!("query top {} accounts for updates", self.config.batch_size);

        match self.source.fetch_top(self.config.batch_size).await {
            Ok(batch) => {
                report.fetched = batch.len();
                report.published = self.publish_changes(batch).await;
            }
            Err(e) => {
                warn!(error = %e, "error from account source, retrying next cycle");
                report.fetch_failed = true;
            }
        }

        if self.last_message.elapsed() >= self.config.keep_alive_interval {
            match self.publisher.publish(Message::keep_alive()).await {
                Ok(()) => {
                    self.last_message = Instant::now();
                    report.keep_alive = true;
                    info!("sending empty object for keep-alive");
                }
                Err(e) => error!(error = %e, "unable to send keep-alive"),
            }
        }

        report
    }

    async fn publish_changes(&mut self, batch: Vec<Account>) -> usize {
        let mut published = 0;

        for account in batch {
            let Some(changed) = self.detector.observe(account) else {
                continue;
            };
            let account_id = changed.account_id.clone();

            let message = match Message::account(changed) {
                Ok(message) => message,
                Err(e) => {
                    error!(account = %account_id, error = %e, "unable to serialize changed account");
                    continue;
                }
            };

            match self.publisher.publish(message).await {
                Ok(()) => {
                    published += 1;
                    self.last_message = Instant::now();
                    info!(account = %account_id, "Sending updated account");
                }
                Err(e) => error!(account = %account_id, error = %e, "unable to send changed account"),
            }
        }

        published
    }
}
