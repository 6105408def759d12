//! In-process message bus over bounded tokio channels.
//!
//! Work-queue semantics: one subscriber per queue, messages delivered in
//! publish order within the process. Used by the test suites and by
//! single-process development runs. Publishing to a full queue blocks, which
//! is what makes the publisher's bounded timeout observable.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use notelink_core::{Error, Result};

use crate::bus::{Acker, BusSubscription, Delivery, MessageBus, SubscriptionStream};
use crate::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug)]
struct MemoryMessage {
    payload: Vec<u8>,
    redelivered: bool,
}

struct QueueState {
    tx: mpsc::Sender<MemoryMessage>,
    /// Present until the single subscriber claims it.
    rx: Option<mpsc::Receiver<MemoryMessage>>,
}

/// In-memory implementation of [`MessageBus`].
#[derive(Clone)]
pub struct MemoryBus {
    queues: Arc<Mutex<HashMap<String, QueueState>>>,
    capacity: usize,
}

impl Default for MemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBus {
    /// Create a bus whose queues hold [`DEFAULT_QUEUE_CAPACITY`] messages.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a bus with a specific per-queue capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            capacity,
        }
    }

    fn sender_for(&self, queue: &str) -> mpsc::Sender<MemoryMessage> {
        let mut queues = self.queues.lock().expect("queue map poisoned");
        queues
            .entry(queue.to_string())
            .or_insert_with(|| {
                let (tx, rx) = mpsc::channel(self.capacity);
                QueueState { tx, rx: Some(rx) }
            })
            .tx
            .clone()
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn declare(&self, queue: &str) -> Result<()> {
        self.sender_for(queue);
        debug!(
            subsystem = "bus",
            component = "memory_bus",
            queue,
            "Queue declared"
        );
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<()> {
        let tx = self.sender_for(queue);
        tx.send(MemoryMessage {
            payload,
            redelivered: false,
        })
        .await
        .map_err(|_| Error::Bus(format!("queue '{}' is closed", queue)))
    }

    async fn subscribe(&self, queue: &str) -> Result<BusSubscription> {
        let (tx, rx) = {
            let mut queues = self.queues.lock().expect("queue map poisoned");
            let state = queues.entry(queue.to_string()).or_insert_with(|| {
                let (tx, rx) = mpsc::channel(self.capacity);
                QueueState { tx, rx: Some(rx) }
            });
            let rx = state.rx.take().ok_or_else(|| {
                Error::Bus(format!("queue '{}' already has a subscriber", queue))
            })?;
            (state.tx.clone(), rx)
        };

        Ok(BusSubscription::new(MemorySubscription { rx, requeue_tx: tx }))
    }
}

struct MemorySubscription {
    rx: mpsc::Receiver<MemoryMessage>,
    requeue_tx: mpsc::Sender<MemoryMessage>,
}

#[async_trait]
impl SubscriptionStream for MemorySubscription {
    async fn next(&mut self) -> Option<Result<Delivery>> {
        let msg = self.rx.recv().await?;
        let acker = MemoryAcker {
            requeue_tx: self.requeue_tx.clone(),
            payload: msg.payload.clone(),
        };
        Some(Ok(Delivery::new(
            msg.payload,
            msg.redelivered,
            Box::new(acker),
        )))
    }
}

struct MemoryAcker {
    requeue_tx: mpsc::Sender<MemoryMessage>,
    payload: Vec<u8>,
}

#[async_trait]
impl Acker for MemoryAcker {
    async fn ack(self: Box<Self>) -> Result<()> {
        Ok(())
    }

    async fn nack(self: Box<Self>, requeue: bool) -> Result<()> {
        if !requeue {
            return Ok(());
        }
        self.requeue_tx
            .try_send(MemoryMessage {
                payload: self.payload,
                redelivered: true,
            })
            .map_err(|_| Error::Bus("requeue failed: queue full or closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_then_subscribe_preserves_order() {
        let bus = MemoryBus::new();
        bus.declare("q").await.unwrap();
        bus.publish("q", b"one".to_vec()).await.unwrap();
        bus.publish("q", b"two".to_vec()).await.unwrap();

        let mut sub = bus.subscribe("q").await.unwrap();
        let first = sub.next().await.unwrap().unwrap();
        assert_eq!(first.payload, b"one");
        assert!(!first.redelivered);
        first.ack().await.unwrap();

        let second = sub.next().await.unwrap().unwrap();
        assert_eq!(second.payload, b"two");
        second.ack().await.unwrap();
    }

    #[tokio::test]
    async fn test_single_subscriber_per_queue() {
        let bus = MemoryBus::new();
        let _sub = bus.subscribe("q").await.unwrap();
        assert!(bus.subscribe("q").await.is_err());
    }

    #[tokio::test]
    async fn test_nack_requeues_with_redelivered_flag() {
        let bus = MemoryBus::new();
        bus.publish("q", b"retry me".to_vec()).await.unwrap();

        let mut sub = bus.subscribe("q").await.unwrap();
        let delivery = sub.next().await.unwrap().unwrap();
        delivery.nack(true).await.unwrap();

        let redelivery = sub.next().await.unwrap().unwrap();
        assert_eq!(redelivery.payload, b"retry me");
        assert!(redelivery.redelivered);
        redelivery.ack().await.unwrap();
    }

    #[tokio::test]
    async fn test_nack_without_requeue_drops() {
        let bus = MemoryBus::new();
        bus.publish("q", b"poison".to_vec()).await.unwrap();
        bus.publish("q", b"next".to_vec()).await.unwrap();

        let mut sub = bus.subscribe("q").await.unwrap();
        sub.next().await.unwrap().unwrap().nack(false).await.unwrap();

        let next = sub.next().await.unwrap().unwrap();
        assert_eq!(next.payload, b"next");
    }

    #[tokio::test]
    async fn test_publish_blocks_when_queue_full() {
        let bus = MemoryBus::with_capacity(1);
        bus.publish("q", b"fills the queue".to_vec()).await.unwrap();

        let blocked = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            bus.publish("q", b"stuck".to_vec()),
        )
        .await;
        assert!(blocked.is_err(), "publish to a full queue should block");
    }
}
