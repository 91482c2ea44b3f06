//! `KafkaStreamSource` — the production [`StreamSource`].
//!
//! One `StreamConsumer` is created and subscribed at startup and kept for the
//! life of the process. A poll collects messages until the timeout elapses
//! or `max_batch` is reached.

use async_trait::async_trait;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::time::Duration;
use tracing::{info, warn};

use weblog_core::{PipelineError, RawMessage, StreamSource};

use crate::config::KafkaSourceConfig;

/// How long startup waits for broker metadata before giving up.
const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KafkaStreamSource {
    consumer: StreamConsumer,
    topic: String,
    max_batch: usize,
}

impl KafkaStreamSource {
    /// Create the consumer, subscribe to the topic and confirm the brokers
    /// answer. Any failure here is a `PipelineError::Connection`.
    ///
    /// Must be called from a multi-threaded Tokio runtime.
    pub fn connect(config: &KafkaSourceConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let consumer: StreamConsumer = config
            .to_client_config()
            .create()
            .map_err(|e| PipelineError::connection("kafka", e))?;

        // librdkafka connects lazily; ask for metadata so an unreachable
        // cluster fails startup instead of the first poll.
        let metadata = tokio::task::block_in_place(|| {
            consumer.fetch_metadata(Some(&config.topic), METADATA_TIMEOUT)
        })
        .map_err(|e| PipelineError::connection("kafka", e))?;

        let partitions = partition_count(
            metadata.topics().iter().map(|t| (t.name(), t.partitions().len())),
            &config.topic,
        );
        if partitions.is_none() {
            warn!(
                brokers = %config.brokers,
                topic = %config.topic,
                "Topic not found in cluster metadata; check the topic name"
            );
        }
        let partitions = partitions.unwrap_or(0);

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| PipelineError::connection("kafka", e))?;

        info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            partitions,
            "Kafka consumer subscribed"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
            max_batch: config.max_batch,
        })
    }
}

#[async_trait]
impl StreamSource for KafkaStreamSource {
    async fn poll(&self, timeout: Duration) -> Result<Vec<RawMessage>, PipelineError> {
        let deadline = tokio::time::Instant::now() + timeout;
        let mut batch = Vec::new();

        while batch.len() < self.max_batch {
            match tokio::time::timeout_at(deadline, self.consumer.recv()).await {
                Err(_elapsed) => break,
                Ok(Ok(msg)) => batch.push(raw_message(&msg)),
                Ok(Err(e)) if batch.is_empty() => {
                    return Err(PipelineError::Source(e.to_string()));
                }
                Ok(Err(e)) => {
                    // Keep what already arrived; the error resurfaces on the
                    // next poll if it persists.
                    warn!(topic = %self.topic, error = %e, "Kafka error mid-batch");
                    break;
                }
            }
        }

        Ok(batch)
    }

    fn name(&self) -> &str {
        &self.topic
    }
}

/// Partition count of `topic` in a metadata listing of `(name, partitions)`,
/// or `None` when the cluster does not report the topic.
fn partition_count<'a>(
    topics: impl IntoIterator<Item = (&'a str, usize)>,
    topic: &str,
) -> Option<usize> {
    topics
        .into_iter()
        .find(|(name, _)| *name == topic)
        .map(|(_, partitions)| partitions)
}

/// Convert any rdkafka message into a [`RawMessage`].
///
/// A missing payload (tombstone) becomes an empty string and invalid UTF-8
/// is replaced lossily; both then fail decoding like any malformed payload.
pub fn raw_message<M: Message>(msg: &M) -> RawMessage {
    let payload = match msg.payload_view::<str>() {
        None => String::new(),
        Some(Ok(text)) => text.to_string(),
        Some(Err(_)) => String::from_utf8_lossy(msg.payload().unwrap_or_default()).into_owned(),
    };
    RawMessage::new(msg.topic(), msg.partition(), msg.offset(), payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdkafka::message::{OwnedMessage, Timestamp};

    fn owned(payload: Option<Vec<u8>>) -> OwnedMessage {
        OwnedMessage::new(
            payload,
            None,
            "hr-test-web-log".to_string(),
            Timestamp::NotAvailable,
            3,
            42,
            None,
        )
    }

    #[test]
    fn partition_count_finds_subscribed_topic() {
        let listing = [("other", 1), ("hr-test-web-log", 6)];
        assert_eq!(partition_count(listing, "hr-test-web-log"), Some(6));
    }

    #[test]
    fn partition_count_is_none_for_unknown_topic() {
        let listing = [("hr-test-web-logs", 6)];
        assert_eq!(partition_count(listing, "hr-test-web-log"), None);
        assert_eq!(partition_count(Vec::<(&str, usize)>::new(), "hr-test-web-log"), None);
    }

    #[test]
    fn converts_text_payload_and_position() {
        let raw = raw_message(&owned(Some(br#"{"cusno":"C1"}"#.to_vec())));
        assert_eq!(raw.topic, "hr-test-web-log");
        assert_eq!(raw.partition, 3);
        assert_eq!(raw.offset, 42);
        assert_eq!(raw.payload, r#"{"cusno":"C1"}"#);
    }

    #[test]
    fn tombstone_becomes_empty_payload() {
        let raw = raw_message(&owned(None));
        assert!(raw.payload.is_empty());
        assert!(weblog_core::decode(&raw.payload).is_err());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let raw = raw_message(&owned(Some(vec![b'{', 0xff, b'}'])));
        assert_eq!(raw.payload, "{\u{fffd}}");
    }
}
