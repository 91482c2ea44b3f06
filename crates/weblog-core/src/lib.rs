//! weblog-core — the per-message pipeline behind `weblog-consumer`.
//!
//! # Architecture
//!
//! ```text
//! PipelineLoop (poll → process each → maybe report)
//!      │
//!      ├── StreamSource      (batches of RawMessage)
//!      └── MessageProcessor
//!             ├── decode          (RawMessage → DecodedEvent)
//!             ├── EnrichmentLookup (customer id → tier attribute)
//!             ├── TierFilter      (attribute == "01", case-insensitive)
//!             └── RecordSink      (append PersistedRecord)
//!      ThroughputMeter   (records/min, reset on each report)
//! ```
//!
//! Source, lookup and sink are traits so the binary can inject Kafka, Redis
//! and SQL clients while tests inject the in-memory fakes defined here.

pub mod config;
pub mod error;
pub mod event;
pub mod lookup;
pub mod pipeline;
pub mod processor;
pub mod sink;
pub mod source;
pub mod throughput;
pub mod tier;

pub use config::PipelineConfig;
pub use error::{DecodeError, PipelineError};
pub use event::{decode, DecodedEvent, PersistedRecord, RawMessage};
pub use lookup::{EnrichmentLookup, MemoryLookup};
pub use pipeline::{PipelineLoop, PipelineState, PipelineStats};
pub use processor::{MessageOutcome, MessageProcessor};
pub use sink::{MemoryRecordSink, RecordSink};
pub use source::{MemoryStreamSource, StreamSource};
pub use throughput::{ThroughputMeter, ThroughputReport};
pub use tier::TierFilter;
