use alloy_primitives::B256;
use scroll_db::DatabaseError;

/// A [`Result`] that uses [`ProposerError`] as the error type.
pub(crate) type ProposerResult<T> = Result<T, ProposerError>;

/// An error that occurred while proposing a chunk or a batch.
#[derive(Debug, thiserror::Error)]
pub enum ProposerError {
    /// A database error.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// The units to propose are not contiguous.
    #[error("{unit} gap: expected {expected}, got {got}")]
    Gap {
        /// The kind of unit, `block` or `chunk`.
        unit: &'static str,
        /// The expected number or index.
        expected: u64,
        /// The number or index found.
        got: u64,
    },
    /// A block does not extend the previous one.
    #[error("block {number} has parent {got}, expected {expected}")]
    ParentHashMismatch {
        /// The block number.
        number: u64,
        /// The hash of the previous block.
        expected: B256,
        /// The parent hash of the block.
        got: B256,
    },
    /// A chunk does not start from the state root the previous one ended at.
    #[error("chunk {index} starts from state root {got}, expected {expected}")]
    StateRootMismatch {
        /// The chunk index.
        index: u64,
        /// The post state root of the previous chunk.
        expected: B256,
        /// The prev state root of the chunk.
        got: B256,
    },
    /// Another proposal was recorded while this one was built.
    #[error("concurrent {unit} proposal: expected last index {expected:?}, found {found:?}")]
    ConcurrentProposal {
        /// The kind of proposal, `chunk` or `batch`.
        unit: &'static str,
        /// The last index the proposal was built on.
        expected: Option<u64>,
        /// The last index found when recording the proposal.
        found: Option<u64>,
    },
}

impl ProposerError {
    /// Returns true if the proposer should stop, as the recorded units can no longer be trusted.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Database(err) => err.is_fatal(),
            Self::Gap { .. } | Self::ParentHashMismatch { .. } | Self::StateRootMismatch { .. } => {
                true
            }
            Self::ConcurrentProposal { .. } => false,
        }
    }
}
