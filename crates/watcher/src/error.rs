use alloy_primitives::B256;
use rollup_relayer_providers::ProviderError;
use scroll_db::DatabaseError;

/// A [`Result`] that uses [`L2WatcherError`] as the error type.
pub(crate) type L2WatcherResult<T> = Result<T, L2WatcherError>;

/// An error that occurred with the L2 watcher.
#[derive(Debug, thiserror::Error)]
pub enum L2WatcherError {
    /// An error with the L2 provider.
    #[error("l2 provider error: {0}")]
    Provider(#[from] ProviderError),
    /// A database error.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// An error related to logs in the L2 watcher.
    #[error(transparent)]
    Logs(#[from] FilterLogError),
    /// The provider returned a block other than the requested one.
    #[error("requested block {expected}, got block {got}")]
    UnexpectedBlock {
        /// The requested block number.
        expected: u64,
        /// The returned block number.
        got: u64,
    },
    /// A confirmed block does not extend the recorded chain.
    #[error("block {number} has parent {got}, expected {expected}")]
    ParentHashMismatch {
        /// The block number.
        number: u64,
        /// The hash of the recorded parent.
        expected: B256,
        /// The parent hash of the fetched block.
        got: B256,
    },
}

impl L2WatcherError {
    /// Returns true if the watcher should stop, as the recorded chain can no longer be trusted.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::ParentHashMismatch { .. } => true,
            Self::Database(err) => err.is_fatal(),
            _ => false,
        }
    }
}

/// An error that occurred when filtering logs.
#[derive(Debug, thiserror::Error)]
pub enum FilterLogError {
    /// The log is missing a block number.
    #[error("missing block number for log")]
    MissingBlockNumber,
    /// The log is missing a transaction hash.
    #[error("unknown transaction hash for log")]
    MissingTransactionHash,
    /// The message queue index does not fit in a u64.
    #[error("invalid message queue index")]
    InvalidQueueIndex,
    /// Failed to decode a log of the given type.
    #[error("failed to decode log of type {log_type}: {error}")]
    DecodeLogFailed {
        /// The type of the log.
        log_type: &'static str,
        /// The decoding error.
        error: alloy_sol_types::Error,
    },
}
