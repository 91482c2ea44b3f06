//! Record sink trait and an in-memory implementation.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::PipelineError;
use crate::event::PersistedRecord;

/// Appends accepted records to durable storage.
///
/// Every `append` is an independent write. Failures are reported as
/// `PipelineError::Persist`; callers log them and move on without retrying.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: &PersistedRecord) -> Result<(), PipelineError>;
}

/// In-memory sink for tests and local runs.
#[derive(Default)]
pub struct MemoryRecordSink {
    records: Mutex<Vec<PersistedRecord>>,
    failing: AtomicBool,
}

impl MemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every `append` fails.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn records(&self) -> Vec<PersistedRecord> {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordSink for MemoryRecordSink {
    async fn append(&self, record: &PersistedRecord) -> Result<(), PipelineError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(PipelineError::Persist("sink rejected write".into()));
        }
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());
        Ok(())
    }
}
