//! Stream source trait and an in-memory implementation.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::PipelineError;
use crate::event::RawMessage;

/// A source of message batches (Kafka in production).
///
/// The connection behind a source is opened once and reused for the life of
/// the process. Implementations must not reconnect or retry on their own.
#[async_trait]
pub trait StreamSource: Send + Sync {
    /// Wait up to `timeout` for messages. An empty batch is a normal result.
    async fn poll(&self, timeout: Duration) -> Result<Vec<RawMessage>, PipelineError>;

    /// Human-readable name for logs (e.g. the topic).
    fn name(&self) -> &str;
}

/// In-memory source for tests and local runs.
///
/// Queued batches (or failures) are handed out one per `poll`; once drained,
/// `poll` sleeps for the timeout and returns an empty batch, like an idle
/// broker.
#[derive(Default)]
pub struct MemoryStreamSource {
    queue: Mutex<VecDeque<Result<Vec<RawMessage>, String>>>,
    next_offset: Mutex<i64>,
}

impl MemoryStreamSource {
    pub const TOPIC: &'static str = "memory";

    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch of raw payloads, assigning consecutive offsets.
    pub fn push_payloads<I, S>(&self, payloads: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut offset = self.next_offset.lock().unwrap_or_else(|e| e.into_inner());
        let batch = payloads
            .into_iter()
            .map(|p| {
                let msg = RawMessage::new(Self::TOPIC, 0, *offset, p);
                *offset += 1;
                msg
            })
            .collect();
        self.push_batch(batch);
    }

    pub fn push_batch(&self, batch: Vec<RawMessage>) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Ok(batch));
    }

    /// Make the next `poll` fail with a source error.
    pub fn push_failure(&self, reason: impl Into<String>) {
        self.queue
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Err(reason.into()));
    }

    pub fn is_drained(&self) -> bool {
        self.queue.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }
}

#[async_trait]
impl StreamSource for MemoryStreamSource {
    async fn poll(&self, timeout: Duration) -> Result<Vec<RawMessage>, PipelineError> {
        let next = self.queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
        match next {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(reason)) => Err(PipelineError::Source(reason)),
            None => {
                tokio::time::sleep(timeout).await;
                Ok(Vec::new())
            }
        }
    }

    fn name(&self) -> &str {
        Self::TOPIC
    }
}
