pub mod preflight;
pub mod producer;
pub mod redis_client;
pub mod stream_broker;
pub mod trim;

pub use producer::{Producer, ProducerOptions};
pub use redis_client::{RedisConnection, RedisOptions};
pub use stream_broker::StreamBroker;

#[cfg(test)]
pub use stream_broker::MockStreamBroker;
