use rollup_relayer_primitives::RollupTxKind;
use rollup_relayer_providers::ProviderError;
use scroll_db::DatabaseError;

/// A [`Result`] that uses [`RelayerError`] as the error type.
pub(crate) type RelayerResult<T> = Result<T, RelayerError>;

/// An error that occurred with the L1 relayer.
#[derive(Debug, thiserror::Error)]
pub enum RelayerError {
    /// An error with the L1 provider.
    #[error("l1 provider error: {0}")]
    Provider(#[from] ProviderError),
    /// A database error.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// The relayer account failed to sign a transaction.
    #[error("failed to sign transaction: {0}")]
    Signer(#[from] alloy_signer::Error),
    /// A chunk of a batch is not recorded.
    #[error("batch {batch_index} is missing chunk {chunk_index}")]
    MissingChunk {
        /// The batch index.
        batch_index: u64,
        /// The chunk index.
        chunk_index: u64,
    },
    /// A block of a chunk is not recorded.
    #[error("chunk {chunk_index} is missing block {number}")]
    MissingBlock {
        /// The chunk index.
        chunk_index: u64,
        /// The block number.
        number: u64,
    },
    /// A chunk does not fit the fixed width fields of the commit calldata.
    #[error("chunk {chunk_index} overflows the {field} of the commit calldata")]
    ChunkOverflow {
        /// The chunk index.
        chunk_index: u64,
        /// The overflowing field.
        field: &'static str,
    },
    /// A pending transaction has no recorded attempt.
    #[error("{kind} transaction of batch {batch_index} has no attempt")]
    MissingAttempt {
        /// The batch index.
        batch_index: u64,
        /// The transaction kind.
        kind: RollupTxKind,
    },
    /// A persisted attempt could not be decoded.
    #[error("invalid attempt of the {kind} transaction of batch {batch_index}: {error}")]
    InvalidAttempt {
        /// The batch index.
        batch_index: u64,
        /// The transaction kind.
        kind: RollupTxKind,
        /// The decoding error.
        error: alloy_eips::eip2718::Eip2718Error,
    },
}

impl RelayerError {
    /// Returns true if the relayer should stop, as the recorded batches can no longer be trusted.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Database(err) => err.is_fatal(),
            Self::MissingChunk { .. } |
            Self::MissingBlock { .. } |
            Self::ChunkOverflow { .. } |
            Self::MissingAttempt { .. } |
            Self::InvalidAttempt { .. } => true,
            Self::Provider(_) | Self::Signer(_) => false,
        }
    }
}
