use metrics::{Counter, Gauge, Histogram};
use metrics_derive::Metrics;

/// The metrics for the [`super::L2Watcher`].
#[derive(Metrics)]
#[metrics(scope = "l2_watcher")]
pub struct L2WatcherMetrics {
    /// A counter on the L2 blocks recorded.
    pub blocks_watched: Counter,
    /// A counter on the L2 to L1 messages recorded.
    pub messages_watched: Counter,
    /// A counter on the messages sent through the L2 messenger.
    pub messages_sent: Counter,
    /// The highest L2 block at the confirmation depth.
    pub last_confirmed_height: Gauge,
    /// A histogram of the duration of a backfill.
    pub fetch_duration: Histogram,
}
