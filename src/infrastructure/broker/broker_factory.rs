use std::sync::Arc;

use crate::application::ports::{BrokerError, MessageBroker};
use crate::presentation::config::{BrokerProvider, BrokerSettings};

use super::in_memory_broker::InMemoryBroker;
use super::redis_broker::RedisBroker;

pub struct BrokerFactory;

impl BrokerFactory {
    /// `consumer` names this process inside the consumer group; keep it stable
    /// across restarts so pending deliveries are replayed to it.
    pub async fn create(
        settings: &BrokerSettings,
        consumer: &str,
    ) -> Result<Arc<dyn MessageBroker>, BrokerError> {
        match settings.provider {
            BrokerProvider::Redis => {
                let broker = RedisBroker::connect(&settings.url, &settings.group, consumer).await?;
                Ok(Arc::new(broker))
            }
            BrokerProvider::Memory => Ok(Arc::new(InMemoryBroker::new())),
        }
    }
}
