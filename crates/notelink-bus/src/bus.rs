//! The message bus seam.
//!
//! The bus itself is an external collaborator; this trait specifies it only
//! at its boundary so implementations are pluggable (in-memory for tests and
//! single-process runs, AMQP for deployment). Deliveries carry an explicit
//! acknowledgement handle: consumers acknowledge only after a successful (or
//! definitively permanent-failure) apply, never at receipt.

use async_trait::async_trait;

use notelink_core::Result;

/// An at-least-once, single-queue delivery channel.
///
/// Within one publishing connection, message order is preserved end-to-end.
/// Across connections, no global order exists; consumers must not assume
/// temporal ordering between messages.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Provision a queue so publishes and subscriptions can no-fail race it.
    ///
    /// Called explicitly at service startup; there is no warm-up message.
    async fn declare(&self, queue: &str) -> Result<()>;

    /// Publish a payload to a queue.
    ///
    /// Blocking from the caller's perspective; callers that need a bound
    /// wrap this in a timeout. Once a timeout fires the attempt is
    /// abandoned, but the underlying operation may still complete — sends
    /// are at-least-once, not exactly-once.
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<()>;

    /// Attach the single long-lived subscriber for a queue.
    async fn subscribe(&self, queue: &str) -> Result<BusSubscription>;
}

/// A message pulled from the bus, pending acknowledgement.
pub struct Delivery {
    /// The raw payload.
    pub payload: Vec<u8>,
    /// Whether the bus has delivered this message before.
    pub redelivered: bool,
    acker: Box<dyn Acker>,
}

impl Delivery {
    /// Build a delivery around an implementation-specific acker.
    pub fn new(payload: Vec<u8>, redelivered: bool, acker: Box<dyn Acker>) -> Self {
        Self {
            payload,
            redelivered,
            acker,
        }
    }

    /// Acknowledge the message; the bus will not redeliver it.
    pub async fn ack(self) -> Result<()> {
        self.acker.ack().await
    }

    /// Reject the message, optionally requeueing it for redelivery.
    pub async fn nack(self, requeue: bool) -> Result<()> {
        self.acker.nack(requeue).await
    }
}

/// Implementation-specific acknowledgement handle.
#[async_trait]
pub trait Acker: Send {
    async fn ack(self: Box<Self>) -> Result<()>;
    async fn nack(self: Box<Self>, requeue: bool) -> Result<()>;
}

/// The receiving end of a queue subscription.
pub struct BusSubscription {
    inner: Box<dyn SubscriptionStream>,
}

impl BusSubscription {
    pub fn new(inner: impl SubscriptionStream + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    /// Receive the next delivery.
    ///
    /// Returns `None` when the bus side of the subscription has closed.
    pub async fn next(&mut self) -> Option<Result<Delivery>> {
        self.inner.next().await
    }
}

/// Implementation side of [`BusSubscription`].
#[async_trait]
pub trait SubscriptionStream: Send {
    async fn next(&mut self) -> Option<Result<Delivery>>;
}
