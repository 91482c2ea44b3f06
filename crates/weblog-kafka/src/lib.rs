//! weblog-kafka — [`StreamSource`](weblog_core::StreamSource) over an
//! rdkafka `StreamConsumer`.

pub mod config;
pub mod source;

pub use config::KafkaSourceConfig;
pub use source::{raw_message, KafkaStreamSource};
