//! The link consumer (agenda-service side).
//!
//! A single sequential worker subscribes once at service startup and applies
//! envelopes to the event store for the lifetime of the process. Because it
//! is the only worker, applies are never concurrent with each other; the
//! only remaining concurrency is with direct HTTP-driven updates, which the
//! store's atomic per-document operations absorb.
//!
//! Acknowledgement discipline: a delivery is acked only after its apply
//! succeeds, or after it has been handed to the dead-letter queue following
//! a bounded number of attempts. Undecodable payloads are poison messages —
//! logged and dropped, never retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use notelink_core::{EventStore, LinkEnvelope, Result, LINK_QUEUE};

use crate::bus::{BusSubscription, Delivery, MessageBus};
use crate::{dead_letter_queue, DEFAULT_MAX_APPLY_ATTEMPTS, DEFAULT_PUBLISH_TIMEOUT_SECS};

/// Configuration for the link consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Queue the consumer subscribes to.
    pub queue: String,
    /// Bound on apply attempts per delivery before dead-lettering.
    pub max_apply_attempts: u32,
    /// Pause between failed apply attempts.
    pub retry_backoff: Duration,
    /// Bound on the dead-letter publish; on expiry the delivery is requeued.
    pub publish_timeout: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            queue: LINK_QUEUE.to_string(),
            max_apply_attempts: DEFAULT_MAX_APPLY_ATTEMPTS,
            retry_backoff: Duration::from_millis(500),
            publish_timeout: Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS),
        }
    }
}

impl ConsumerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LINK_QUEUE` | `note-event-links` | Queue name |
    /// | `MAX_APPLY_ATTEMPTS` | `5` | Attempts before dead-lettering |
    /// | `APPLY_RETRY_BACKOFF_MS` | `500` | Pause between attempts |
    /// | `PUBLISH_TIMEOUT_SECS` | `5` | Bound on the dead-letter publish |
    pub fn from_env() -> Self {
        let queue = std::env::var("LINK_QUEUE").unwrap_or_else(|_| LINK_QUEUE.to_string());
        let max_apply_attempts = std::env::var("MAX_APPLY_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_MAX_APPLY_ATTEMPTS)
            .max(1);
        let retry_backoff = std::env::var("APPLY_RETRY_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(500));
        let publish_timeout = std::env::var("PUBLISH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS));

        Self {
            queue,
            max_apply_attempts,
            retry_backoff,
            publish_timeout,
        }
    }

    /// Set the bound on apply attempts.
    pub fn with_max_apply_attempts(mut self, attempts: u32) -> Self {
        self.max_apply_attempts = attempts.max(1);
        self
    }

    /// Set the retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the dead-letter publish timeout.
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }
}

/// Handle for controlling a running consumer.
pub struct ConsumerHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: tokio::task::JoinHandle<()>,
}

impl ConsumerHandle {
    /// Signal the consumer to stop after the in-flight delivery and wait for
    /// it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.join.await;
    }
}

/// Applies link envelopes from the bus to the event store.
pub struct LinkConsumer {
    store: Arc<dyn EventStore>,
    bus: Arc<dyn MessageBus>,
    config: ConsumerConfig,
}

impl LinkConsumer {
    /// Create a consumer with default configuration.
    pub fn new(store: Arc<dyn EventStore>, bus: Arc<dyn MessageBus>) -> Self {
        Self::with_config(store, bus, ConsumerConfig::default())
    }

    /// Create a consumer with explicit configuration.
    pub fn with_config(
        store: Arc<dyn EventStore>,
        bus: Arc<dyn MessageBus>,
        config: ConsumerConfig,
    ) -> Self {
        Self { store, bus, config }
    }

    /// Provision the queue and its dead-letter pair, then subscribe.
    ///
    /// Called once at service startup; a failure here is fatal to the owning
    /// process.
    pub async fn subscribe(&self) -> Result<BusSubscription> {
        self.bus.declare(&self.config.queue).await?;
        self.bus
            .declare(&dead_letter_queue(&self.config.queue))
            .await?;
        self.bus.subscribe(&self.config.queue).await
    }

    /// Start the worker loop and return a handle for control.
    pub fn start(self, subscription: BusSubscription) -> ConsumerHandle {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let join = tokio::spawn(async move {
            self.run(subscription, shutdown_rx).await;
        });

        ConsumerHandle { shutdown_tx, join }
    }

    /// Sequential worker loop: one delivery at a time, for the life of the
    /// process.
    async fn run(&self, mut subscription: BusSubscription, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            subsystem = "bus",
            component = "link_consumer",
            queue = %self.config.queue,
            max_apply_attempts = self.config.max_apply_attempts,
            "Link consumer started"
        );

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!(
                        subsystem = "bus",
                        component = "link_consumer",
                        "Link consumer received shutdown signal"
                    );
                    break;
                }
                next = subscription.next() => {
                    match next {
                        Some(Ok(delivery)) => self.process(delivery).await,
                        Some(Err(e)) => {
                            error!(
                                subsystem = "bus",
                                component = "link_consumer",
                                error = %e,
                                "Subscription error"
                            );
                            // A persistently erroring stream must not spin
                            // the worker at full speed.
                            sleep(self.config.retry_backoff).await;
                        }
                        None => {
                            error!(
                                subsystem = "bus",
                                component = "link_consumer",
                                "Subscription closed; link consumer stopping"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            subsystem = "bus",
            component = "link_consumer",
            "Link consumer stopped"
        );
    }

    /// Handle one delivery: decode, apply with bounded retries, acknowledge.
    async fn process(&self, delivery: Delivery) {
        let start = Instant::now();

        let envelope = match LinkEnvelope::decode(&delivery.payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                // Poison message: drop it, no retry, no dead-letter routing.
                warn!(
                    subsystem = "bus",
                    component = "link_consumer",
                    op = "decode",
                    error = %e,
                    payload_len = delivery.payload.len(),
                    "Dropping undecodable envelope"
                );
                if let Err(e) = delivery.ack().await {
                    error!(
                        subsystem = "bus",
                        component = "link_consumer",
                        error = %e,
                        "Failed to ack poison message"
                    );
                }
                return;
            }
        };

        let mut last_err = None;
        for attempt in 1..=self.config.max_apply_attempts {
            match self.apply(&envelope).await {
                Ok(matched) => {
                    debug!(
                        subsystem = "bus",
                        component = "link_consumer",
                        op = "apply",
                        note_id = %envelope.note,
                        event_id = %envelope.target,
                        unlink = envelope.is_unlink(),
                        matched,
                        attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Applied link envelope"
                    );
                    if let Err(e) = delivery.ack().await {
                        error!(
                            subsystem = "bus",
                            component = "link_consumer",
                            error = %e,
                            "Failed to ack applied envelope"
                        );
                    }
                    return;
                }
                Err(e) => {
                    warn!(
                        subsystem = "bus",
                        component = "link_consumer",
                        op = "apply",
                        note_id = %envelope.note,
                        attempt,
                        error = %e,
                        "Apply failed"
                    );
                    last_err = Some(e);
                    if attempt < self.config.max_apply_attempts {
                        sleep(self.config.retry_backoff).await;
                    }
                }
            }
        }

        self.dead_letter(delivery, &envelope, last_err).await;
    }

    /// Apply an envelope to the event store. Idempotent: reapplying a link
    /// sets the same value, reapplying an unlink matches nothing.
    ///
    /// Returns the number of documents matched. Zero means the referenced
    /// entity is already gone — the expected outcome of a stale envelope,
    /// accepted silently.
    pub async fn apply(&self, envelope: &LinkEnvelope) -> Result<u64> {
        if envelope.is_unlink() {
            self.store.unlink_note(envelope.note).await
        } else {
            self.store.link_note(envelope.target, envelope.note).await
        }
    }

    /// Route a permanently failing delivery to the dead-letter queue, then
    /// ack it. The publish is bounded by `publish_timeout` so a wedged
    /// broker cannot hang the sole worker. If the publish fails or times
    /// out, the delivery is requeued so the bus redelivers it later.
    async fn dead_letter(
        &self,
        delivery: Delivery,
        envelope: &LinkEnvelope,
        last_err: Option<notelink_core::Error>,
    ) {
        let dlq = dead_letter_queue(&self.config.queue);
        error!(
            subsystem = "bus",
            component = "link_consumer",
            op = "dead_letter",
            queue = %dlq,
            note_id = %envelope.note,
            attempts = self.config.max_apply_attempts,
            error = %last_err.map(|e| e.to_string()).unwrap_or_default(),
            "Apply attempts exhausted; routing envelope to dead-letter queue"
        );

        let published = timeout(
            self.config.publish_timeout,
            self.bus.publish(&dlq, delivery.payload.clone()),
        )
        .await
        .unwrap_or_else(|_| {
            Err(notelink_core::Error::Timeout(format!(
                "dead-letter publish to '{}' exceeded {}s",
                dlq,
                self.config.publish_timeout.as_secs()
            )))
        });

        match published {
            Ok(()) => {
                if let Err(e) = delivery.ack().await {
                    error!(
                        subsystem = "bus",
                        component = "link_consumer",
                        error = %e,
                        "Failed to ack dead-lettered envelope"
                    );
                }
            }
            Err(e) => {
                error!(
                    subsystem = "bus",
                    component = "link_consumer",
                    error = %e,
                    "Dead-letter publish failed; requeueing delivery"
                );
                if let Err(e) = delivery.nack(true).await {
                    error!(
                        subsystem = "bus",
                        component = "link_consumer",
                        error = %e,
                        "Failed to requeue delivery"
                    );
                }
            }
        }
    }
}
