mod broker_factory;
mod in_memory_broker;
mod redis_broker;

pub use broker_factory::BrokerFactory;
pub use in_memory_broker::InMemoryBroker;
pub use redis_broker::RedisBroker;
