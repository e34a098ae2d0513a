use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::application::ports::{BrokerError, Delivery, MessageBroker, Subscription};

struct Message {
    payload: Vec<u8>,
    redelivered: bool,
}

#[derive(Default)]
struct QueueState {
    ready: Mutex<VecDeque<Message>>,
    notify: Notify,
    next_tag: AtomicU64,
}

impl QueueState {
    fn pop(&self) -> Option<Message> {
        self.ready.lock().ok()?.pop_front()
    }

    fn push_back(&self, message: Message) {
        if let Ok(mut ready) = self.ready.lock() {
            ready.push_back(message);
        }
        self.notify.notify_one();
    }

    fn requeue_front(&self, messages: Vec<Message>) {
        if let Ok(mut ready) = self.ready.lock() {
            for message in messages.into_iter().rev() {
                ready.push_front(message);
            }
        }
        self.notify.notify_one();
    }

    fn len(&self) -> usize {
        self.ready.lock().map(|r| r.len()).unwrap_or(0)
    }
}

/// Single-process broker with the same delivery contract as the Redis one:
/// deliveries still unacknowledged when their subscription is dropped go back
/// to the head of the queue flagged as redelivered.
#[derive(Default)]
pub struct InMemoryBroker {
    queues: Mutex<HashMap<String, Arc<QueueState>>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn queue(&self, name: &str) -> Result<Arc<QueueState>, BrokerError> {
        let mut queues = self
            .queues
            .lock()
            .map_err(|e| BrokerError::ConnectionFailed(e.to_string()))?;
        Ok(Arc::clone(queues.entry(name.to_string()).or_default()))
    }

    /// Messages waiting for a consumer, excluding in-flight ones.
    pub fn pending(&self, queue: &str) -> usize {
        self.queue(queue).map(|q| q.len()).unwrap_or(0)
    }

    /// Wakes every subscriber; further `next` calls return `None`.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Ok(queues) = self.queues.lock() {
            for queue in queues.values() {
                queue.notify.notify_waiters();
                queue.notify.notify_one();
            }
        }
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, queue: &str, payload: &[u8]) -> Result<(), BrokerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BrokerError::PublishFailed("broker is closed".to_string()));
        }
        self.queue(queue)?.push_back(Message {
            payload: payload.to_vec(),
            redelivered: false,
        });
        Ok(())
    }

    async fn subscribe(
        &self,
        queue: &str,
        prefetch: usize,
    ) -> Result<Box<dyn Subscription>, BrokerError> {
        Ok(Box::new(InMemorySubscription {
            queue: self.queue(queue)?,
            closed: Arc::clone(&self.closed),
            prefetch: prefetch.max(1),
            in_flight: HashMap::new(),
        }))
    }
}

struct InMemorySubscription {
    queue: Arc<QueueState>,
    closed: Arc<AtomicBool>,
    prefetch: usize,
    in_flight: HashMap<String, Message>,
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn next(&mut self) -> Result<Option<Delivery>, BrokerError> {
        if self.in_flight.len() >= self.prefetch {
            return Err(BrokerError::PrefetchExhausted(self.prefetch));
        }

        loop {
            if self.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            if let Some(message) = self.queue.pop() {
                let tag = self.queue.next_tag.fetch_add(1, Ordering::Relaxed).to_string();
                let delivery = Delivery {
                    tag: tag.clone(),
                    payload: message.payload.clone(),
                    redelivered: message.redelivered,
                };
                self.in_flight.insert(tag, message);
                return Ok(Some(delivery));
            }
            self.queue.notify.notified().await;
        }
    }

    async fn ack(&mut self, delivery: &Delivery) -> Result<(), BrokerError> {
        self.in_flight
            .remove(&delivery.tag)
            .map(|_| ())
            .ok_or_else(|| BrokerError::UnknownDelivery(delivery.tag.clone()))
    }
}

impl Drop for InMemorySubscription {
    fn drop(&mut self) {
        if self.in_flight.is_empty() {
            return;
        }
        let mut unacked: Vec<(u64, Message)> = self
            .in_flight
            .drain()
            .map(|(tag, mut message)| {
                message.redelivered = true;
                (tag.parse().unwrap_or(u64::MAX), message)
            })
            .collect();
        unacked.sort_by_key(|(tag, _)| *tag);
        self.queue
            .requeue_front(unacked.into_iter().map(|(_, m)| m).collect());
    }
}
