use async_trait::async_trait;

/// Queue carrying [`RelocationTask`](crate::domain::RelocationTask) messages.
pub const UPLOAD_QUEUE: &str = "file_uploads";
/// Queue carrying [`StatusEvent`](crate::domain::StatusEvent) messages.
pub const STATUS_QUEUE: &str = "job_updates";

/// Durable point-to-point queues with at-least-once delivery.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Returns once the broker has accepted the message.
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Attaches a consumer that may hold at most `prefetch` unacknowledged
    /// deliveries at a time.
    async fn subscribe(
        &self,
        queue: &str,
        prefetch: usize,
    ) -> Result<Box<dyn Subscription>, BrokerError>;
}

/// A consumer attached to one queue.
///
/// Deliveries that are never acknowledged are handed out again, either to a
/// later subscription on the same queue or after a consumer restart.
#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next delivery. `None` once the broker has shut down.
    async fn next(&mut self) -> Result<Option<Delivery>, BrokerError>;

    async fn ack(&mut self, delivery: &Delivery) -> Result<(), BrokerError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub tag: String,
    pub payload: Vec<u8>,
    pub redelivered: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("consume failed: {0}")]
    ConsumeFailed(String),
    #[error("ack failed: {0}")]
    AckFailed(String),
    #[error("prefetch of {0} exhausted; acknowledge a delivery first")]
    PrefetchExhausted(usize),
    #[error("unknown delivery tag: {0}")]
    UnknownDelivery(String),
}
