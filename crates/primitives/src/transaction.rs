use alloy_primitives::{Address, Bytes, B256};

/// The kind of L1 transaction sent for a batch.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum RollupTxKind {
    /// Commits the batch data to L1.
    Commit,
    /// Finalizes the batch on L1 with its validity proof.
    Finalize,
}

impl RollupTxKind {
    /// Returns the string representation persisted in the database.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// The status of a rollup transaction.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum RollupTxStatus {
    /// Broadcast, not yet confirmed.
    Pending,
    /// Included and confirmed at the required depth.
    Confirmed,
    /// Abandoned after exhausting the replacement policy, with a transfer to the sender
    /// broadcast at the same nonce so that later transactions of the account can be included.
    Cancelling,
    /// Reverted, or cancelled once its nonce was filled.
    Failed,
}

impl RollupTxStatus {
    /// Returns the string representation persisted in the database.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// The EIP-1559 gas parameters of a transaction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    /// The gas limit.
    pub gas_limit: u64,
    /// The maximum fee per gas.
    pub max_fee_per_gas: u128,
    /// The maximum priority fee per gas.
    pub max_priority_fee_per_gas: u128,
}

/// A single broadcast of a rollup transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionAttempt {
    /// The transaction hash.
    pub hash: B256,
    /// The gas parameters of the attempt.
    pub gas: GasParams,
    /// The signed, EIP-2718 encoded transaction.
    pub raw: Bytes,
    /// The unix timestamp of the broadcast.
    pub submitted_at: u64,
}

/// An L1 transaction committing or finalizing a batch.
///
/// Each replacement appends an attempt with the same nonce and a higher fee, so a receipt for any
/// of the attempts resolves the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupTransaction {
    /// The batch the transaction is for.
    pub batch_index: u64,
    /// The transaction kind.
    pub kind: RollupTxKind,
    /// The sending account.
    pub sender: Address,
    /// The account nonce shared by all attempts.
    pub nonce: u64,
    /// The transaction status.
    pub status: RollupTxStatus,
    /// The broadcast attempts, oldest first.
    pub attempts: Vec<TransactionAttempt>,
}

impl RollupTransaction {
    /// Returns the most recent attempt.
    pub fn latest_attempt(&self) -> Option<&TransactionAttempt> {
        self.attempts.last()
    }

    /// Returns the number of fee-bumped replacements sent after the first attempt.
    pub fn replacements(&self) -> u64 {
        self.attempts.len().saturating_sub(1) as u64
    }

    /// Returns the unix timestamp of the most recent broadcast.
    pub fn last_submitted_at(&self) -> Option<u64> {
        self.latest_attempt().map(|a| a.submitted_at)
    }
}
