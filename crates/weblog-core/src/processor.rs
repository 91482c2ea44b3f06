//! Per-message processing: decode → enrich → filter → persist.
//!
//! [`MessageProcessor::process`] is the single failure boundary of the
//! pipeline. It never returns an error; every failure is logged here once
//! and reported back as a [`MessageOutcome`].

use std::sync::Arc;
use tracing::{debug, error};

use crate::error::{DecodeError, PipelineError};
use crate::event::{decode, PersistedRecord, RawMessage};
use crate::lookup::EnrichmentLookup;
use crate::sink::RecordSink;
use crate::tier::TierFilter;

/// What happened to one message.
#[derive(Debug)]
pub enum MessageOutcome {
    /// Tier matched and the record was written.
    Persisted,
    /// Lookup succeeded but the tier did not match (or was absent).
    Filtered { tier: Option<String> },
    /// Lookup failed; treated as non-matching.
    LookupFailed(PipelineError),
    /// Tier matched but the sink rejected the write. Not retried.
    PersistFailed(PipelineError),
    /// Payload could not be decoded; nothing else ran.
    DecodeFailed(DecodeError),
}

impl MessageOutcome {
    /// Whether the message counts toward throughput.
    ///
    /// Every message that was fully evaluated counts, whether or not it was
    /// persisted. Only decode failures are excluded.
    pub fn counts_as_processed(&self) -> bool {
        !matches!(self, Self::DecodeFailed(_))
    }
}

pub struct MessageProcessor {
    lookup: Arc<dyn EnrichmentLookup>,
    sink: Arc<dyn RecordSink>,
    filter: TierFilter,
    tier_attribute: String,
}

impl MessageProcessor {
    pub fn new(
        lookup: Arc<dyn EnrichmentLookup>,
        sink: Arc<dyn RecordSink>,
        filter: TierFilter,
        tier_attribute: impl Into<String>,
    ) -> Self {
        Self {
            lookup,
            sink,
            filter,
            tier_attribute: tier_attribute.into(),
        }
    }

    pub async fn process(&self, msg: &RawMessage) -> MessageOutcome {
        let event = match decode(&msg.payload) {
            Ok(event) => event,
            Err(e) => {
                error!(
                    topic = %msg.topic,
                    partition = msg.partition,
                    offset = msg.offset,
                    error = %e,
                    "Failed to decode message"
                );
                return MessageOutcome::DecodeFailed(e);
            }
        };

        let tier = match self
            .lookup
            .get_attribute(&event.customer_id, &self.tier_attribute)
            .await
        {
            Ok(tier) => tier,
            Err(e) => {
                error!(
                    offset = msg.offset,
                    cusno = %event.customer_id,
                    error = %e,
                    "Enrichment lookup failed"
                );
                return MessageOutcome::LookupFailed(e);
            }
        };

        if !self.filter.accepts(tier.as_deref()) {
            debug!(cusno = %event.customer_id, tier = ?tier, "Tier not matched, skipping");
            return MessageOutcome::Filtered { tier };
        }

        let record = PersistedRecord::from(&event);
        match self.sink.append(&record).await {
            Ok(()) => {
                debug!(cusno = %record.cusno, offset = msg.offset, "Record persisted");
                MessageOutcome::Persisted
            }
            Err(e) => {
                error!(
                    offset = msg.offset,
                    cusno = %record.cusno,
                    error = %e,
                    "Failed to save record"
                );
                MessageOutcome::PersistFailed(e)
            }
        }
    }
}
