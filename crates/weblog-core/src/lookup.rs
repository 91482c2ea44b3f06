//! Enrichment lookup trait and an in-memory implementation.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::PipelineError;

/// Reads one attribute of a key from an external key/attribute store.
///
/// One round trip per call, no caching, no retry. A missing key or field is
/// `Ok(None)`; transport failures are `Err(PipelineError::Lookup)`.
#[async_trait]
pub trait EnrichmentLookup: Send + Sync {
    async fn get_attribute(
        &self,
        key: &str,
        attribute: &str,
    ) -> Result<Option<String>, PipelineError>;
}

/// In-memory attribute store for tests and local runs.
#[derive(Default)]
pub struct MemoryLookup {
    data: Mutex<HashMap<(String, String), String>>,
    failing_keys: Mutex<HashSet<String>>,
    unavailable: AtomicBool,
    calls: AtomicU64,
}

impl MemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, attribute: impl Into<String>, value: impl Into<String>) {
        self.data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert((key.into(), attribute.into()), value.into());
    }

    /// Lookups for `key` fail until cleared.
    pub fn fail_for(&self, key: impl Into<String>) {
        self.failing_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.into());
    }

    /// Simulate the whole store being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Number of `get_attribute` calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl EnrichmentLookup for MemoryLookup {
    async fn get_attribute(
        &self,
        key: &str,
        attribute: &str,
    ) -> Result<Option<String>, PipelineError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if self.unavailable.load(Ordering::Relaxed) {
            return Err(PipelineError::Lookup("store unavailable".into()));
        }
        if self
            .failing_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
        {
            return Err(PipelineError::Lookup(format!("lookup of '{key}' timed out")));
        }

        Ok(self
            .data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(key.to_string(), attribute.to_string()))
            .cloned())
    }
}
