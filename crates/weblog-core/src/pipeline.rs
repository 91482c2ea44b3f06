//! The polling loop that drives the pipeline.
//!
//! Each iteration: poll a batch (bounded by `poll_timeout`), process every
//! message in order through [`MessageProcessor`], then emit the throughput
//! line if the reporting window has elapsed. The loop runs until its
//! [`CancellationToken`] fires; a poll in progress is allowed to complete and
//! its batch is processed before `run` returns.
//!
//! There is no retry and no backoff anywhere in the loop. A failed poll is
//! logged and the next poll goes to the same source handle.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::event::RawMessage;
use crate::lookup::EnrichmentLookup;
use crate::processor::{MessageOutcome, MessageProcessor};
use crate::sink::RecordSink;
use crate::source::StreamSource;
use crate::throughput::{ThroughputMeter, ThroughputReport};
use crate::tier::TierFilter;

/// Lifecycle state of a [`PipelineLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Lifetime totals, independent of the resetting throughput window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub batches: u64,
    pub processed: u64,
    pub persisted: u64,
    pub filtered: u64,
    pub decode_errors: u64,
    pub lookup_errors: u64,
    pub persist_errors: u64,
    pub poll_errors: u64,
}

impl PipelineStats {
    fn record(&mut self, outcome: &MessageOutcome) {
        if outcome.counts_as_processed() {
            self.processed += 1;
        }
        match outcome {
            MessageOutcome::Persisted => self.persisted += 1,
            MessageOutcome::Filtered { .. } => self.filtered += 1,
            MessageOutcome::LookupFailed(_) => self.lookup_errors += 1,
            MessageOutcome::PersistFailed(_) => self.persist_errors += 1,
            MessageOutcome::DecodeFailed(_) => self.decode_errors += 1,
        }
    }
}

pub struct PipelineLoop {
    config: PipelineConfig,
    source: Arc<dyn StreamSource>,
    processor: MessageProcessor,
    meter: ThroughputMeter,
    stats: PipelineStats,
    state: PipelineState,
}

impl PipelineLoop {
    /// Wire a loop from already-connected collaborators.
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn StreamSource>,
        lookup: Arc<dyn EnrichmentLookup>,
        sink: Arc<dyn RecordSink>,
    ) -> Self {
        let processor = MessageProcessor::new(
            lookup,
            sink,
            TierFilter::new(config.tier_code.clone()),
            config.tier_attribute.clone(),
        );
        Self {
            meter: ThroughputMeter::new(config.report_interval(), Instant::now()),
            source,
            processor,
            stats: PipelineStats::default(),
            state: PipelineState::Idle,
            config,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Count processed since the last throughput report.
    pub fn pending_throughput(&self) -> u64 {
        self.meter.pending()
    }

    /// Run until `cancel` fires, then return the lifetime totals.
    pub async fn run(&mut self, cancel: CancellationToken) -> PipelineStats {
        self.state = PipelineState::Running;
        self.meter.restart(Instant::now());
        info!(source = self.source.name(), "Listening for messages...");

        let poll_timeout = self.config.poll_timeout();

        while !cancel.is_cancelled() {
            // The poll is bounded by `poll_timeout` and not raced against
            // `cancel`: messages it has already taken from the source must
            // be processed before the loop exits.
            match self.source.poll(poll_timeout).await {
                Ok(batch) => {
                    self.process_batch(&batch).await;
                }
                Err(e) => {
                    self.stats.poll_errors += 1;
                    error!(source = self.source.name(), error = %e, "Poll failed");
                    // Wait out one poll window so a dead source does not spin.
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(poll_timeout) => {}
                    }
                }
            }

            self.report_if_due(Instant::now());
        }

        self.state = PipelineState::Stopping;
        info!(
            unreported = self.meter.pending(),
            processed = self.stats.processed,
            persisted = self.stats.persisted,
            "Pipeline stopping"
        );
        self.state = PipelineState::Stopped;
        self.stats.clone()
    }

    /// Poll once and process whatever arrives. Returns the batch size.
    pub async fn poll_once(&mut self) -> usize {
        match self.source.poll(self.config.poll_timeout()).await {
            Ok(batch) => {
                self.process_batch(&batch).await;
                batch.len()
            }
            Err(e) => {
                self.stats.poll_errors += 1;
                error!(source = self.source.name(), error = %e, "Poll failed");
                0
            }
        }
    }

    /// Emit the throughput line if the window has elapsed at `now`.
    pub fn report_if_due(&mut self, now: Instant) -> Option<ThroughputReport> {
        let report = self.meter.maybe_report(now)?;
        info!(count = report.count, "{report}");
        Some(report)
    }

    async fn process_batch(&mut self, batch: &[RawMessage]) {
        if batch.is_empty() {
            return;
        }
        self.stats.batches += 1;
        for msg in batch {
            let outcome = self.processor.process(msg).await;
            if outcome.counts_as_processed() {
                self.meter.record_processed();
            }
            self.stats.record(&outcome);
        }
    }
}
