//! AMQP 0.9.1 implementation of the message bus seam.
//!
//! Connects once at service startup with explicit queue provisioning; the
//! handle is created by the binary and injected into the publisher and
//! consumer rather than living in ambient state. Publishes use publisher
//! confirms so a broker rejection surfaces to the caller; consumption uses
//! manual acknowledgement so the consumer can ack after apply, not at
//! receipt.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    ConfirmSelectOptions, QueueDeclareOptions,
};
use lapin::publisher_confirm::Confirmation;
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tracing::{debug, info};

use notelink_core::{Error, Result, CONTENT_TYPE_TEXT};

use crate::bus::{Acker, BusSubscription, Delivery, MessageBus, SubscriptionStream};

/// AMQP (RabbitMQ) implementation of [`MessageBus`].
pub struct AmqpBus {
    // The connection must outlive the channel or the broker closes it.
    _connection: Connection,
    channel: Channel,
}

impl AmqpBus {
    /// Connect to a broker and open a confirmed channel.
    pub async fn connect(url: &str) -> Result<Self> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(|e| Error::Bus(format!("broker connect failed: {}", e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| Error::Bus(format!("channel open failed: {}", e)))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| Error::Bus(format!("confirm-select failed: {}", e)))?;

        info!(
            subsystem = "bus",
            component = "amqp",
            op = "connect",
            "AMQP channel established"
        );

        Ok(Self {
            _connection: connection,
            channel,
        })
    }
}

#[async_trait]
impl MessageBus for AmqpBus {
    async fn declare(&self, queue: &str) -> Result<()> {
        self.channel
            .queue_declare(queue, QueueDeclareOptions::default(), FieldTable::default())
            .await
            .map_err(|e| Error::Bus(format!("queue declare '{}' failed: {}", queue, e)))?;

        debug!(
            subsystem = "bus",
            component = "amqp",
            queue,
            "Queue declared"
        );
        Ok(())
    }

    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<()> {
        let confirmation = self
            .channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                &payload,
                BasicProperties::default().with_content_type(CONTENT_TYPE_TEXT.into()),
            )
            .await
            .map_err(|e| Error::Bus(format!("publish to '{}' failed: {}", queue, e)))?
            .await
            .map_err(|e| Error::Bus(format!("publish confirm failed: {}", e)))?;

        if let Confirmation::Nack(_) = confirmation {
            return Err(Error::Bus(format!(
                "broker negatively acknowledged publish to '{}'",
                queue
            )));
        }
        Ok(())
    }

    async fn subscribe(&self, queue: &str) -> Result<BusSubscription> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                "link-consumer",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| Error::Bus(format!("consume on '{}' failed: {}", queue, e)))?;

        Ok(BusSubscription::new(AmqpSubscription { consumer }))
    }
}

struct AmqpSubscription {
    consumer: lapin::Consumer,
}

#[async_trait]
impl SubscriptionStream for AmqpSubscription {
    async fn next(&mut self) -> Option<Result<Delivery>> {
        match self.consumer.next().await {
            None => None,
            Some(Err(e)) => Some(Err(Error::Bus(format!("delivery failed: {}", e)))),
            Some(Ok(delivery)) => {
                let acker = AmqpAcker {
                    acker: delivery.acker,
                };
                Some(Ok(Delivery::new(
                    delivery.data,
                    delivery.redelivered,
                    Box::new(acker),
                )))
            }
        }
    }
}

struct AmqpAcker {
    acker: lapin::acker::Acker,
}

#[async_trait]
impl Acker for AmqpAcker {
    async fn ack(self: Box<Self>) -> Result<()> {
        self.acker
            .ack(BasicAckOptions::default())
            .await
            .map_err(|e| Error::Bus(format!("ack failed: {}", e)))
    }

    async fn nack(self: Box<Self>, requeue: bool) -> Result<()> {
        self.acker
            .nack(BasicNackOptions {
                requeue,
                ..Default::default()
            })
            .await
            .map_err(|e| Error::Bus(format!("nack failed: {}", e)))
    }
}
