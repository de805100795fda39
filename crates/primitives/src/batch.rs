use crate::Chunk;
use alloy_primitives::{keccak256, Bytes, B256};

/// The lifecycle status of a batch.
///
/// Statuses only move forward: `unassigned → pending_commit → committed → pending_finalize →
/// finalized`, with `failed` reachable from either pending status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BatchStatus {
    /// Proposed, not yet submitted to L1.
    Unassigned,
    /// A commit transaction is in flight.
    PendingCommit,
    /// The commit transaction is confirmed.
    Committed,
    /// A finalize transaction is in flight.
    PendingFinalize,
    /// The finalize transaction is confirmed.
    Finalized,
    /// A transaction for the batch failed permanently.
    Failed,
}

impl BatchStatus {
    /// Returns the string representation persisted in the database.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Returns true if the batch may move from `self` to `next`.
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unassigned, Self::PendingCommit) |
                (Self::PendingCommit, Self::Committed | Self::Failed) |
                (Self::Committed, Self::PendingFinalize) |
                (Self::PendingFinalize, Self::Finalized | Self::Failed)
        )
    }

    /// Returns true if no further transition is possible.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Finalized | Self::Failed)
    }

    /// Returns true if a transaction for the batch is in flight.
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::PendingCommit | Self::PendingFinalize)
    }
}

/// The estimated L1 cost of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchCost {
    /// The estimated commit calldata size in bytes.
    pub calldata_size: u64,
    /// The estimated proving cost.
    pub proof_cost: u64,
    /// The estimated L1 gas of the commit transaction.
    pub commit_gas: u64,
}

/// A contiguous range of chunks committed and finalized on L1 together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// The batch index.
    pub index: u64,
    /// The batch hash.
    pub hash: B256,
    /// The hash of the previous batch.
    pub parent_hash: B256,
    /// The keccak of the concatenated chunk hashes.
    pub data_hash: B256,
    /// The first chunk of the batch.
    pub start_chunk_index: u64,
    /// The last chunk of the batch.
    pub end_chunk_index: u64,
    /// The first L2 block covered by the batch.
    pub start_block_number: u64,
    /// The last L2 block covered by the batch.
    pub end_block_number: u64,
    /// The state root before the batch.
    pub prev_state_root: B256,
    /// The state root after the batch.
    pub post_state_root: B256,
    /// The withdraw root after the batch.
    pub withdraw_root: B256,
    /// The estimated cost of the batch.
    pub cost: BatchCost,
    /// The batch status.
    pub status: BatchStatus,
    /// The validity proof, once delivered by the prover.
    pub proof: Option<Bytes>,
    /// The unix timestamp the batch was proposed at.
    pub created_at: u64,
    /// The unix timestamp the commit was confirmed at.
    pub committed_at: Option<u64>,
    /// The unix timestamp the finalization was confirmed at.
    pub finalized_at: Option<u64>,
}

impl Batch {
    /// Builds the batch at `index` covering `chunks`. Returns [`None`] if `chunks` is empty.
    ///
    /// The caller is responsible for the chunks being contiguous.
    pub fn from_chunks(
        index: u64,
        parent_hash: B256,
        chunks: &[Chunk],
        cost: BatchCost,
        created_at: u64,
    ) -> Option<Self> {
        let (first, last) = (chunks.first()?, chunks.last()?);

        let chunk_hashes = chunks.iter().flat_map(|c| c.hash.0).collect::<Vec<_>>();
        let data_hash = keccak256(&chunk_hashes);

        let mut header = Vec::with_capacity(8 + 32 * 5);
        header.extend_from_slice(&index.to_be_bytes());
        header.extend_from_slice(parent_hash.as_slice());
        header.extend_from_slice(data_hash.as_slice());
        header.extend_from_slice(first.prev_state_root.as_slice());
        header.extend_from_slice(last.post_state_root.as_slice());
        header.extend_from_slice(last.withdraw_root.as_slice());

        Some(Self {
            index,
            hash: keccak256(&header),
            parent_hash,
            data_hash,
            start_chunk_index: first.index,
            end_chunk_index: last.index,
            start_block_number: first.start_block_number,
            end_block_number: last.end_block_number,
            prev_state_root: first.prev_state_root,
            post_state_root: last.post_state_root,
            withdraw_root: last.withdraw_root,
            cost,
            status: BatchStatus::Unassigned,
            proof: None,
            created_at,
            committed_at: None,
            finalized_at: None,
        })
    }

    /// Returns the number of chunks in the batch.
    pub const fn num_chunks(&self) -> u64 {
        self.end_chunk_index - self.start_chunk_index + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_status_transitions_are_monotonic() {
        for from in BatchStatus::iter() {
            for to in BatchStatus::iter() {
                if from.can_transition_to(to) {
                    assert!(to > from, "{from} -> {to} moves backwards");
                    assert!(!from.is_terminal());
                }
            }
        }
        assert!(BatchStatus::PendingCommit.can_transition_to(BatchStatus::Failed));
        assert!(!BatchStatus::Committed.can_transition_to(BatchStatus::Failed));
        assert!(!BatchStatus::Unassigned.can_transition_to(BatchStatus::Committed));
    }

    #[test]
    fn test_status_string_representation() {
        for status in BatchStatus::iter() {
            assert_eq!(BatchStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert_eq!(BatchStatus::PendingFinalize.as_str(), "pending_finalize");
        assert!(BatchStatus::from_str("proving").is_err());
    }

    #[test]
    fn test_batch_from_chunks() {
        let chunk = |index: u64, start: u64, end: u64| Chunk {
            index,
            hash: B256::with_last_byte(index as u8),
            start_block_number: start,
            end_block_number: end,
            prev_state_root: B256::repeat_byte(start as u8),
            post_state_root: B256::repeat_byte(end as u8),
            ..Default::default()
        };
        let chunks = [chunk(4, 10, 12), chunk(5, 13, 20)];
        let batch =
            Batch::from_chunks(2, B256::repeat_byte(0xaa), &chunks, BatchCost::default(), 7)
                .unwrap();

        assert_eq!(batch.start_chunk_index, 4);
        assert_eq!(batch.end_chunk_index, 5);
        assert_eq!(batch.num_chunks(), 2);
        assert_eq!(batch.start_block_number, 10);
        assert_eq!(batch.end_block_number, 20);
        assert_eq!(batch.prev_state_root, B256::repeat_byte(10));
        assert_eq!(batch.post_state_root, B256::repeat_byte(20));
        assert_eq!(batch.status, BatchStatus::Unassigned);

        let other =
            Batch::from_chunks(2, B256::repeat_byte(0xbb), &chunks, BatchCost::default(), 7)
                .unwrap();
        assert_ne!(batch.hash, other.hash);
    }
}
