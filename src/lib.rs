//! Productor para streams de Redis con retención acotada (MAXLEN / MINID).
//!
//! ```no_run
//! use redis_stream_producer::{Message, Producer};
//!
//! # async fn run() -> redis_stream_producer::Result<()> {
//! let producer = Producer::new().await?;
//! let mut msg = Message::new("orders").with_value("id", "42");
//! producer.enqueue(&mut msg).await?;
//! println!("ID asignado: {:?}", msg.id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod services;

pub use errors::{QueueError, Result};
pub use models::{AppendRequest, FieldValue, Message, TrimPolicy};
pub use services::{Producer, ProducerOptions, RedisConnection, RedisOptions, StreamBroker};
