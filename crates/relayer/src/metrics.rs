use metrics::{Counter, Gauge, Histogram};
use metrics_derive::Metrics;

/// The metrics for the [`super::L1Relayer`].
#[derive(Metrics, Clone)]
#[metrics(scope = "l1_relayer")]
pub struct L1RelayerMetrics {
    /// A counter on the transactions submitted.
    pub transactions_submitted: Counter,
    /// A counter on the fee-bumped replacements.
    pub transactions_replaced: Counter,
    /// A counter on the transactions confirmed.
    pub transactions_confirmed: Counter,
    /// A counter on the transactions that failed permanently.
    pub transactions_failed: Counter,
    /// A counter on the transactions abandoned and cancelled.
    pub transactions_cancelled: Counter,
    /// A counter on the broadcasts rejected by the L1 node.
    pub broadcast_errors: Counter,
    /// The age in seconds of the oldest batch that is neither finalized nor failed.
    pub oldest_pending_batch_age: Gauge,
    /// The duration of a commit scan.
    pub commit_scan_duration: Histogram,
    /// The duration of a finalize scan.
    pub finalize_scan_duration: Histogram,
}
