//! Redis Streams broker.
//!
//! Each queue is a stream consumed through one consumer group. A delivery
//! stays in the group's pending list until acknowledged with `XACK`; on
//! subscribe the consumer first replays its own pending entries, which is how
//! a restarted worker picks up the task it crashed on.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client};

use crate::application::ports::{BrokerError, Delivery, MessageBroker, Subscription};

const PAYLOAD_FIELD: &str = "payload";
const BLOCK_INTERVAL: Duration = Duration::from_secs(5);

pub struct RedisBroker {
    client: Client,
    publisher: ConnectionManager,
    group: String,
    consumer: String,
}

impl RedisBroker {
    /// Connects and verifies the server is reachable.
    pub async fn connect(
        url: &str,
        group: impl Into<String>,
        consumer: impl Into<String>,
    ) -> Result<Self, BrokerError> {
        let client =
            Client::open(url).map_err(|e| BrokerError::ConnectionFailed(e.to_string()))?;
        let publisher = client
            .get_connection_manager()
            .await
            .map_err(|e| BrokerError::ConnectionFailed(e.to_string()))?;

        let group = group.into();
        let consumer = consumer.into();
        tracing::info!(group = %group, consumer = %consumer, "Connected to Redis broker");

        Ok(Self {
            client,
            publisher,
            group,
            consumer,
        })
    }

    async fn ensure_group(
        &self,
        conn: &mut MultiplexedConnection,
        queue: &str,
    ) -> Result<(), BrokerError> {
        let created: redis::RedisResult<()> =
            conn.xgroup_create_mkstream(queue, &self.group, "0").await;
        match created {
            Ok(()) => Ok(()),
            Err(e) if e.code() == Some("BUSYGROUP") => Ok(()),
            Err(e) => Err(BrokerError::ConnectionFailed(e.to_string())),
        }
    }
}

#[async_trait]
impl MessageBroker for RedisBroker {
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let mut conn = self.publisher.clone();
        let entry_id: String = conn
            .xadd(queue, "*", &[(PAYLOAD_FIELD, payload)])
            .await
            .map_err(|e| BrokerError::PublishFailed(e.to_string()))?;
        tracing::debug!(queue = %queue, entry_id = %entry_id, "Message published");
        Ok(())
    }

    async fn subscribe(
        &self,
        queue: &str,
        prefetch: usize,
    ) -> Result<Box<dyn Subscription>, BrokerError> {
        // Dedicated connection: XREADGROUP BLOCK would stall a shared one.
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::ConnectionFailed(e.to_string()))?;
        self.ensure_group(&mut conn, queue).await?;

        Ok(Box::new(RedisSubscription {
            conn,
            queue: queue.to_string(),
            group: self.group.clone(),
            consumer: self.consumer.clone(),
            prefetch: prefetch.max(1),
            in_flight: HashSet::new(),
            backlog_cursor: Some("0".to_string()),
        }))
    }
}

struct RedisSubscription {
    conn: MultiplexedConnection,
    queue: String,
    group: String,
    consumer: String,
    prefetch: usize,
    in_flight: HashSet<String>,
    /// Position in this consumer's pending list while it is being replayed;
    /// `None` once only new entries (`>`) are read.
    backlog_cursor: Option<String>,
}

impl RedisSubscription {
    async fn read_one(
        &mut self,
        start: &str,
        block: bool,
    ) -> Result<Option<(String, Vec<u8>)>, BrokerError> {
        let mut options = StreamReadOptions::default()
            .group(&self.group, &self.consumer)
            .count(1);
        if block {
            options = options.block(BLOCK_INTERVAL.as_millis() as usize);
        }

        let reply: Option<StreamReadReply> = self
            .conn
            .xread_options(&[&self.queue], &[start], &options)
            .await
            .map_err(|e| BrokerError::ConsumeFailed(e.to_string()))?;

        let entry = reply
            .into_iter()
            .flat_map(|r| r.keys)
            .flat_map(|k| k.ids)
            .next();

        Ok(entry.map(|entry| {
            let payload = entry.get::<Vec<u8>>(PAYLOAD_FIELD).unwrap_or_default();
            (entry.id, payload)
        }))
    }
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn next(&mut self) -> Result<Option<Delivery>, BrokerError> {
        if self.in_flight.len() >= self.prefetch {
            return Err(BrokerError::PrefetchExhausted(self.prefetch));
        }

        loop {
            let (start, replaying) = match &self.backlog_cursor {
                Some(cursor) => (cursor.clone(), true),
                None => (">".to_string(), false),
            };

            match self.read_one(&start, !replaying).await? {
                Some((id, payload)) => {
                    if replaying {
                        self.backlog_cursor = Some(id.clone());
                        tracing::info!(
                            queue = %self.queue,
                            entry_id = %id,
                            "Replaying unacknowledged message"
                        );
                    }
                    self.in_flight.insert(id.clone());
                    return Ok(Some(Delivery {
                        tag: id,
                        payload,
                        redelivered: replaying,
                    }));
                }
                None if replaying => self.backlog_cursor = None,
                None => continue,
            }
        }
    }

    async fn ack(&mut self, delivery: &Delivery) -> Result<(), BrokerError> {
        if !self.in_flight.remove(&delivery.tag) {
            return Err(BrokerError::UnknownDelivery(delivery.tag.clone()));
        }
        let _: i64 = self
            .conn
            .xack(&self.queue, &self.group, &[&delivery.tag])
            .await
            .map_err(|e| BrokerError::AckFailed(e.to_string()))?;
        Ok(())
    }
}
