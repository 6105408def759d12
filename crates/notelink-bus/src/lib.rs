//! # notelink-bus
//!
//! The link-propagation transport: the [`MessageBus`] seam, the
//! [`LinkPublisher`] (note-service side), and the [`LinkConsumer`]
//! (agenda-service side).
//!
//! The bus contract is at-least-once delivery with no ordering guarantee
//! across publishing connections. Everything downstream is built to tolerate
//! duplicates and reordering: envelope application is idempotent and never
//! assumes temporal order between envelopes concerning the same note.

#[cfg(feature = "amqp")]
pub mod amqp;
pub mod bus;
pub mod consumer;
pub mod memory;
pub mod publisher;

#[cfg(feature = "amqp")]
pub use amqp::AmqpBus;
pub use bus::{BusSubscription, Delivery, MessageBus};
pub use consumer::{ConsumerConfig, ConsumerHandle, LinkConsumer};
pub use memory::MemoryBus;
pub use publisher::{LinkPublisher, PublisherConfig};

/// Default publish timeout in seconds.
pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 5;

/// Default bound on in-process apply attempts before dead-lettering.
pub const DEFAULT_MAX_APPLY_ATTEMPTS: u32 = 5;

/// Default capacity of an in-memory queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Name of the dead-letter queue paired with `queue`.
pub fn dead_letter_queue(queue: &str) -> String {
    format!("{}.dead-letter", queue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_letter_queue_name() {
        assert_eq!(
            dead_letter_queue(notelink_core::LINK_QUEUE),
            "note-event-links.dead-letter"
        );
    }
}
