//! The link publisher (note-service side).
//!
//! Translates note-lifecycle actions into envelopes and pushes them to the
//! bus. Publishing runs inline on the HTTP request path, synchronous with a
//! bounded timeout, so a slow bus surfaces directly as request latency and a
//! 503 to the caller — who may retry the whole action from scratch.
//!
//! There is no local durability buffer: a committed note-side mutation whose
//! envelope never reaches the bus leaves the stores inconsistent until an
//! out-of-band repair. Deployments that cannot tolerate this should front
//! the bus with a durable outbox.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use notelink_core::{Error, LinkEnvelope, Result, LINK_QUEUE};

use crate::bus::MessageBus;
use crate::DEFAULT_PUBLISH_TIMEOUT_SECS;

/// Configuration for the link publisher.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Queue the envelopes are published to.
    pub queue: String,
    /// Bound on a single publish attempt.
    pub publish_timeout: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            queue: LINK_QUEUE.to_string(),
            publish_timeout: Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS),
        }
    }
}

impl PublisherConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `LINK_QUEUE` | `note-event-links` | Queue name |
    /// | `PUBLISH_TIMEOUT_SECS` | `5` | Bound on one publish attempt |
    pub fn from_env() -> Self {
        let queue = std::env::var("LINK_QUEUE").unwrap_or_else(|_| LINK_QUEUE.to_string());
        let publish_timeout = std::env::var("PUBLISH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS));

        Self {
            queue,
            publish_timeout,
        }
    }

    /// Set the publish timeout.
    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    /// Set the queue name.
    pub fn with_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }
}

/// Publishes link envelopes in response to note-lifecycle actions.
#[derive(Clone)]
pub struct LinkPublisher {
    bus: Arc<dyn MessageBus>,
    config: PublisherConfig,
}

impl LinkPublisher {
    /// Create a publisher with default configuration.
    pub fn new(bus: Arc<dyn MessageBus>) -> Self {
        Self::with_config(bus, PublisherConfig::default())
    }

    /// Create a publisher with explicit configuration.
    pub fn with_config(bus: Arc<dyn MessageBus>, config: PublisherConfig) -> Self {
        Self { bus, config }
    }

    /// Queue this publisher emits to.
    pub fn queue(&self) -> &str {
        &self.config.queue
    }

    /// Emit an unlink envelope for a deleted note.
    ///
    /// Must be called only after the note is confirmed removed from its own
    /// store, so there is no window where the note exists but is already
    /// being unlinked.
    pub async fn note_deleted(&self, note_id: Uuid) -> Result<()> {
        self.send(LinkEnvelope::unlink(note_id)).await
    }

    /// Emit a link envelope for an explicit link request.
    pub async fn link_requested(&self, note_id: Uuid, event_id: Uuid) -> Result<()> {
        self.send(LinkEnvelope::link(event_id, note_id)).await
    }

    async fn send(&self, envelope: LinkEnvelope) -> Result<()> {
        let payload = envelope.encode().into_bytes();

        let result = timeout(
            self.config.publish_timeout,
            self.bus.publish(&self.config.queue, payload),
        )
        .await;

        match result {
            Ok(Ok(())) => {
                info!(
                    subsystem = "bus",
                    component = "publisher",
                    op = "publish",
                    queue = %self.config.queue,
                    note_id = %envelope.note,
                    event_id = %envelope.target,
                    unlink = envelope.is_unlink(),
                    "Published link envelope"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(
                    subsystem = "bus",
                    component = "publisher",
                    queue = %self.config.queue,
                    error = %e,
                    "Publish failed"
                );
                Err(e)
            }
            Err(_) => {
                // The attempt is abandoned, but the underlying send may still
                // land: at-least-once, not exactly-once.
                warn!(
                    subsystem = "bus",
                    component = "publisher",
                    queue = %self.config.queue,
                    timeout_secs = self.config.publish_timeout.as_secs(),
                    "Publish timed out"
                );
                Err(Error::Timeout(format!(
                    "publish to '{}' exceeded {}s",
                    self.config.queue,
                    self.config.publish_timeout.as_secs()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBus;
    use notelink_core::new_id;

    #[test]
    fn test_publisher_config_default() {
        let config = PublisherConfig::default();
        assert_eq!(config.queue, LINK_QUEUE);
        assert_eq!(
            config.publish_timeout,
            Duration::from_secs(DEFAULT_PUBLISH_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_publisher_config_builder() {
        let config = PublisherConfig::default()
            .with_queue("other")
            .with_publish_timeout(Duration::from_secs(1));
        assert_eq!(config.queue, "other");
        assert_eq!(config.publish_timeout, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_note_deleted_publishes_unlink_envelope() {
        let bus = Arc::new(MemoryBus::new());
        let publisher = LinkPublisher::new(bus.clone());
        let note_id = new_id();

        publisher.note_deleted(note_id).await.unwrap();

        let mut sub = bus.subscribe(LINK_QUEUE).await.unwrap();
        let delivery = sub.next().await.unwrap().unwrap();
        let envelope = LinkEnvelope::decode(&delivery.payload).unwrap();
        assert!(envelope.is_unlink());
        assert_eq!(envelope.note, note_id);
    }

    #[tokio::test]
    async fn test_link_requested_publishes_link_envelope() {
        let bus = Arc::new(MemoryBus::new());
        let publisher = LinkPublisher::new(bus.clone());
        let note_id = new_id();
        let event_id = new_id();

        publisher.link_requested(note_id, event_id).await.unwrap();

        let mut sub = bus.subscribe(LINK_QUEUE).await.unwrap();
        let delivery = sub.next().await.unwrap().unwrap();
        let envelope = LinkEnvelope::decode(&delivery.payload).unwrap();
        assert!(!envelope.is_unlink());
        assert_eq!(envelope.target, event_id);
        assert_eq!(envelope.note, note_id);
    }

    #[tokio::test]
    async fn test_publish_timeout_surfaces_as_timeout_error() {
        // Capacity-1 queue, pre-filled and never drained.
        let bus = Arc::new(MemoryBus::with_capacity(1));
        bus.publish(LINK_QUEUE, b"blocker".to_vec()).await.unwrap();

        let config = PublisherConfig::default().with_publish_timeout(Duration::from_millis(50));
        let publisher = LinkPublisher::with_config(bus, config);

        let err = publisher.note_deleted(new_id()).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(err.is_retryable());
    }
}
