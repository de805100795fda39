use alloy_primitives::Address;
use rollup_relayer_primitives::{BatchStatus, RollupTxKind};

/// The error type for database operations.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A database error occurred.
    #[error("database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),
    /// A batch was not found in the database.
    #[error("batch with index [{0}] not found in database")]
    BatchNotFound(u64),
    /// A rollup transaction was not found in the database.
    #[error("{kind} transaction for batch [{batch_index}] not found in database")]
    TransactionNotFound {
        /// The batch index.
        batch_index: u64,
        /// The transaction kind.
        kind: RollupTxKind,
    },
    /// A batch status update would move the batch backwards or skip a status.
    #[error("invalid status transition for batch [{index}]: {from} -> {to}")]
    InvalidStatusTransition {
        /// The batch index.
        index: u64,
        /// The current status.
        from: BatchStatus,
        /// The requested status.
        to: BatchStatus,
    },
    /// The batch was not in the expected status when updating it.
    #[error("batch [{index}] is not in status {expected}")]
    StatusConflict {
        /// The batch index.
        index: u64,
        /// The expected status.
        expected: BatchStatus,
    },
    /// The watermark changed since it was read.
    #[error("watermark conflict: expected {expected:?}, found {found:?}")]
    WatermarkConflict {
        /// The expected watermark.
        expected: Option<u64>,
        /// The persisted watermark.
        found: Option<u64>,
    },
    /// No nonce counter is persisted for the account.
    #[error("nonce counter for {0} not initialized")]
    NonceNotInitialized(Address),
    /// Some of the rows of a range were already assigned or missing.
    #[error("failed to assign {table} range [{start}, {end}]: {assigned} of {expected} rows")]
    AssignmentConflict {
        /// The table of the range.
        table: &'static str,
        /// The start of the range.
        start: u64,
        /// The end of the range.
        end: u64,
        /// The number of rows in the range.
        expected: u64,
        /// The number of rows that were assigned.
        assigned: u64,
    },
    /// A metadata value could not be parsed.
    #[error("invalid metadata value for key {key}: {value}")]
    InvalidMetadata {
        /// The metadata key.
        key: String,
        /// The persisted value.
        value: String,
    },
    /// The genesis block must have number 0.
    #[error("invalid genesis block number {0}")]
    InvalidGenesis(u64),
}

impl DatabaseError {
    /// Returns true if the error reveals an inconsistency in the persisted state rather than a
    /// failure to reach the database.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::DatabaseError(_))
    }
}
