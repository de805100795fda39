use crate::RelayerUnit;

use rollup_relayer_primitives::BatchStatus;
use std::collections::BTreeMap;

/// A snapshot of the progress of the rollup relayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupRelayerStatus {
    /// The highest recorded L2 block.
    pub watermark: Option<u64>,
    /// The number of batches per status.
    pub batches: BTreeMap<BatchStatus, u64>,
    /// The units stopped by a fatal error.
    pub halted: Vec<RelayerUnit>,
    /// Whether the relayer is shutting down.
    pub closing: bool,
}

impl RollupRelayerStatus {
    /// Returns the number of batches in `status`.
    pub fn batch_count(&self, status: BatchStatus) -> u64 {
        self.batches.get(&status).copied().unwrap_or_default()
    }

    /// Returns true if every unit is running.
    pub fn is_healthy(&self) -> bool {
        self.halted.is_empty() && !self.closing
    }
}
