use crate::CloseReason;

use metrics::{Counter, Histogram};
use metrics_derive::Metrics;

/// The metrics for the [`super::ChunkProposer`].
#[derive(Metrics, Clone)]
#[metrics(scope = "chunk_proposer")]
pub struct ChunkProposerMetrics {
    /// A counter on the chunks proposed.
    pub chunks_proposed: Counter,
    /// A counter on the chunks closed before a ceiling.
    pub closed_by_ceiling: Counter,
    /// A counter on the chunks made of a single oversized block.
    pub closed_by_oversized: Counter,
    /// A counter on the chunks closed by the timeout.
    pub closed_by_timeout: Counter,
    /// The number of blocks per chunk.
    pub blocks_per_chunk: Histogram,
    /// The duration of a proposal attempt.
    pub proposal_duration: Histogram,
}

impl ChunkProposerMetrics {
    /// Records a proposed chunk of `blocks` blocks.
    pub(crate) fn record(&self, reason: CloseReason, blocks: u64) {
        self.chunks_proposed.increment(1);
        self.blocks_per_chunk.record(blocks as f64);
        match reason {
            CloseReason::Ceiling(_) => self.closed_by_ceiling.increment(1),
            CloseReason::Oversized(_) => self.closed_by_oversized.increment(1),
            CloseReason::Timeout => self.closed_by_timeout.increment(1),
        }
    }
}

/// The metrics for the [`super::BatchProposer`].
#[derive(Metrics, Clone)]
#[metrics(scope = "batch_proposer")]
pub struct BatchProposerMetrics {
    /// A counter on the batches proposed.
    pub batches_proposed: Counter,
    /// A counter on the batches closed before a ceiling.
    pub closed_by_ceiling: Counter,
    /// A counter on the batches made of a single oversized chunk.
    pub closed_by_oversized: Counter,
    /// A counter on the batches closed by the timeout.
    pub closed_by_timeout: Counter,
    /// The number of chunks per batch.
    pub chunks_per_batch: Histogram,
    /// The estimated L1 commit gas per batch.
    pub commit_gas_per_batch: Histogram,
    /// The duration of a proposal attempt.
    pub proposal_duration: Histogram,
}

impl BatchProposerMetrics {
    /// Records a proposed batch of `chunks` chunks.
    pub(crate) fn record(&self, reason: CloseReason, chunks: u64, commit_gas: u64) {
        self.batches_proposed.increment(1);
        self.chunks_per_batch.record(chunks as f64);
        self.commit_gas_per_batch.record(commit_gas as f64);
        match reason {
            CloseReason::Ceiling(_) => self.closed_by_ceiling.increment(1),
            CloseReason::Oversized(_) => self.closed_by_oversized.increment(1),
            CloseReason::Timeout => self.closed_by_timeout.increment(1),
        }
    }
}
