use std::time::Duration;

/// The default interval between two L2 watcher ticks.
pub(crate) const WATCHER_INTERVAL: Duration = Duration::from_secs(2);

/// The default interval between two chunk proposer ticks.
pub(crate) const CHUNK_PROPOSER_INTERVAL: Duration = Duration::from_secs(2);

/// The default interval between two batch proposer ticks.
pub(crate) const BATCH_PROPOSER_INTERVAL: Duration = Duration::from_secs(10);

/// The default interval between two commit scans of the relayer.
pub(crate) const COMMIT_SCAN_INTERVAL: Duration = Duration::from_secs(2);

/// The default interval between two finalize scans of the relayer.
pub(crate) const FINALIZE_SCAN_INTERVAL: Duration = Duration::from_secs(15);

/// The default bound on how long the relayer drains in-flight transactions on shutdown.
pub(crate) const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// The default timeout of a single RPC call.
pub(crate) const RPC_TIMEOUT_SECS: u64 = 10;

/// The max retries for the providers.
pub(crate) const PROVIDER_MAX_RETRIES: u32 = 10;

/// The initial backoff for the providers, in milliseconds.
pub(crate) const PROVIDER_INITIAL_BACKOFF: u64 = 100;

/// The default provider compute units per second.
pub(crate) const PROVIDER_COMPUTE_UNITS_PER_SECOND: u64 = 10000;

/// The storage slot of the withdraw trie root in the L2 message queue.
pub(crate) const WITHDRAW_TRIE_ROOT_SLOT: u64 = 0;
