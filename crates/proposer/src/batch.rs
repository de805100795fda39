use crate::{
    config::BatchProposerConfig,
    error::ProposerResult,
    greedy::{self, CloseReason, Usage},
    metrics::BatchProposerMetrics,
    ProposerError,
};

use rollup_relayer_primitives::{unix_timestamp, Batch, BatchCost, Chunk};
use scroll_db::{Database, DatabaseOperations};
use std::{sync::Arc, time::Instant};

/// The calldata size of the context of a block in a committed chunk.
pub const BLOCK_CONTEXT_SIZE: u64 = 60;

/// The L1 gas of committing an empty batch.
pub const BASE_COMMIT_GAS: u64 = 100_000;

/// The L1 gas overhead of each chunk of a committed batch.
pub const CHUNK_COMMIT_GAS: u64 = 5_000;

/// The L1 gas per byte of calldata.
pub const CALLDATA_GAS_PER_BYTE: u64 = 16;

/// Returns the commit calldata size of `chunk`: the block count byte, the context of each block
/// and the length prefixed L2 transactions accounted in the chunk payload size.
pub const fn estimate_chunk_calldata_size(chunk: &Chunk) -> u64 {
    1 + BLOCK_CONTEXT_SIZE * chunk.num_blocks() + chunk.payload_size
}

/// The estimated L1 resources consumed by the chunks of a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchUsage {
    /// The number of chunks.
    pub chunks: u64,
    /// The commit calldata size in bytes.
    pub calldata_size: u64,
    /// The proving cost.
    pub proof_cost: u64,
    /// The L1 gas of the commit transaction.
    pub commit_gas: u64,
}

impl BatchUsage {
    /// The usage of a batch before any chunk is added.
    pub const EMPTY: Self =
        Self { chunks: 0, calldata_size: 0, proof_cost: 0, commit_gas: BASE_COMMIT_GAS };
}

impl From<&Chunk> for BatchUsage {
    fn from(chunk: &Chunk) -> Self {
        let calldata_size = estimate_chunk_calldata_size(chunk);
        Self {
            chunks: 1,
            calldata_size,
            proof_cost: chunk.row_consumption,
            commit_gas: CHUNK_COMMIT_GAS + CALLDATA_GAS_PER_BYTE * calldata_size,
        }
    }
}

impl From<&BatchProposerConfig> for BatchUsage {
    fn from(config: &BatchProposerConfig) -> Self {
        Self {
            chunks: config.max_chunk_num_per_batch,
            calldata_size: config.max_calldata_size_per_batch,
            proof_cost: config.max_proof_cost_per_batch,
            commit_gas: config.max_commit_gas_per_batch,
        }
    }
}

impl From<BatchUsage> for BatchCost {
    fn from(usage: BatchUsage) -> Self {
        Self {
            calldata_size: usage.calldata_size,
            proof_cost: usage.proof_cost,
            commit_gas: usage.commit_gas,
        }
    }
}

impl Usage for BatchUsage {
    fn add(&self, other: &Self) -> Self {
        Self {
            chunks: self.chunks + other.chunks,
            calldata_size: self.calldata_size + other.calldata_size,
            proof_cost: self.proof_cost + other.proof_cost,
            commit_gas: self.commit_gas + other.commit_gas,
        }
    }

    fn exceeded(&self, limits: &Self) -> Option<&'static str> {
        if self.chunks > limits.chunks {
            Some("chunk_num")
        } else if self.calldata_size > limits.calldata_size {
            Some("calldata_size")
        } else if self.proof_cost > limits.proof_cost {
            Some("proof_cost")
        } else if self.commit_gas > limits.commit_gas {
            Some("commit_gas")
        } else {
            None
        }
    }
}

/// Groups the proposed chunks into batches ready to be committed on L1.
#[derive(Debug)]
pub struct BatchProposer {
    /// The database.
    database: Arc<Database>,
    /// The proposer configuration.
    config: BatchProposerConfig,
    /// The proposer metrics.
    metrics: BatchProposerMetrics,
}

impl BatchProposer {
    /// Returns a new [`BatchProposer`].
    pub fn new(database: Arc<Database>, config: BatchProposerConfig) -> Self {
        Self { database, config, metrics: BatchProposerMetrics::default() }
    }

    /// Proposes the next batch if enough chunks are recorded or the oldest one timed out.
    pub async fn try_propose_batch(&self) -> ProposerResult<Option<Batch>> {
        self.try_propose_batch_at(unix_timestamp()).await
    }

    /// Proposes the next batch, measuring timeouts against `now`.
    #[tracing::instrument(target = "scroll::proposer", skip(self))]
    pub async fn try_propose_batch_at(&self, now: u64) -> ProposerResult<Option<Batch>> {
        let start_time = Instant::now();

        let last_batch = self.database.get_last_batch().await?;
        let start = last_batch.as_ref().map_or(0, |b| b.end_chunk_index + 1);

        let chunks =
            self.database.get_chunks(start, self.config.max_chunk_num_per_batch + 1).await?;
        if chunks.is_empty() {
            tracing::trace!(target: "scroll::proposer", start, "no unassigned chunks");
            return Ok(None);
        }
        check_chunks(start, last_batch.as_ref(), &chunks)?;

        let usages = chunks.iter().map(BatchUsage::from).collect::<Vec<_>>();
        let limits = BatchUsage::from(&self.config);
        let selection = greedy::select(&usages, BatchUsage::EMPTY, &limits);

        let reason = match selection.closed {
            Some(reason) => reason,
            None if self.config.timeout_mode.is_expired(
                self.config.batch_timeout,
                now,
                chunks[0].start_block_timestamp,
                last_batch.as_ref().map(|b| b.created_at),
            ) =>
            {
                CloseReason::Timeout
            }
            None => {
                tracing::trace!(target: "scroll::proposer", start, chunks = selection.count, "batch still open");
                return Ok(None);
            }
        };

        let index = last_batch.as_ref().map_or(0, |b| b.index + 1);
        let parent_hash = last_batch.as_ref().map(|b| b.hash).unwrap_or_default();
        let chunks = &chunks[..selection.count];
        let Some(batch) =
            Batch::from_chunks(index, parent_hash, chunks, selection.usage.into(), now)
        else {
            return Ok(None);
        };

        let tx = self.database.tx_mut().await?;
        let found = tx.get_last_batch().await?.map(|b| b.index);
        let expected = last_batch.map(|b| b.index);
        if found != expected {
            return Err(ProposerError::ConcurrentProposal { unit: "batch", expected, found });
        }
        tx.insert_batch(batch.clone()).await?;
        tx.assign_chunks_to_batch(batch.start_chunk_index, batch.end_chunk_index, index).await?;
        tx.commit().await?;

        self.metrics.record(reason, batch.num_chunks(), batch.cost.commit_gas);
        self.metrics.proposal_duration.record(start_time.elapsed().as_secs_f64());
        tracing::info!(
            target: "scroll::proposer",
            batch_index = index,
            batch_hash = ?batch.hash,
            start_chunk = batch.start_chunk_index,
            end_chunk = batch.end_chunk_index,
            calldata_size = batch.cost.calldata_size,
            commit_gas = batch.cost.commit_gas,
            %reason,
            "proposed batch"
        );

        Ok(Some(batch))
    }
}

/// Checks that `chunks` start at `start`, extend the `last_batch` and are contiguous.
fn check_chunks(start: u64, last_batch: Option<&Batch>, chunks: &[Chunk]) -> ProposerResult<()> {
    let Some(first) = chunks.first() else { return Ok(()) };
    if first.index != start {
        return Err(ProposerError::Gap { unit: "chunk", expected: start, got: first.index });
    }
    if let Some(batch) = last_batch {
        if first.start_block_number != batch.end_block_number + 1 {
            return Err(ProposerError::Gap {
                unit: "block",
                expected: batch.end_block_number + 1,
                got: first.start_block_number,
            });
        }
        if first.prev_state_root != batch.post_state_root {
            return Err(ProposerError::StateRootMismatch {
                index: first.index,
                expected: batch.post_state_root,
                got: first.prev_state_root,
            });
        }
    }
    for pair in chunks.windows(2) {
        let (prev, chunk) = (&pair[0], &pair[1]);
        if chunk.index != prev.index + 1 {
            return Err(ProposerError::Gap {
                unit: "chunk",
                expected: prev.index + 1,
                got: chunk.index,
            });
        }
        if chunk.start_block_number != prev.end_block_number + 1 {
            return Err(ProposerError::Gap {
                unit: "block",
                expected: prev.end_block_number + 1,
                got: chunk.start_block_number,
            });
        }
        if chunk.prev_state_root != prev.post_state_root {
            return Err(ProposerError::StateRootMismatch {
                index: chunk.index,
                expected: prev.post_state_root,
                got: chunk.prev_state_root,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProposalTimeoutMode;

    use alloy_primitives::B256;
    use rollup_relayer_primitives::{random, BatchStatus, L2Block};
    use scroll_db::test_utils::setup_test_db;
    use std::time::Duration;

    const NOW: u64 = 10_000;

    fn config() -> BatchProposerConfig {
        BatchProposerConfig {
            max_chunk_num_per_batch: 10,
            max_calldata_size_per_batch: 1_000,
            max_proof_cost_per_batch: 1_000_000,
            max_commit_gas_per_batch: 10_000_000,
            batch_timeout: Duration::from_secs(60),
            timeout_mode: ProposalTimeoutMode::OldestUnit,
        }
    }

    /// Records one single-block chunk per payload size.
    async fn setup(
        config: BatchProposerConfig,
        payload_sizes: &[u64],
    ) -> (BatchProposer, Arc<Database>, Vec<Chunk>) {
        let database = Arc::new(setup_test_db().await);
        let mut chunks: Vec<Chunk> = Vec::new();
        for (i, payload_size) in payload_sizes.iter().enumerate() {
            let mut block = random!(L2Block);
            block.number = i as u64;
            block.timestamp = NOW;
            block.payload_size = *payload_size;
            block.row_consumption = 10;
            let prev_state_root = chunks.last().map(|c| c.post_state_root).unwrap_or_default();
            let chunk = Chunk::from_blocks(i as u64, prev_state_root, std::slice::from_ref(&block), NOW).unwrap();
            database.upsert_l2_block(block).await.unwrap();
            database.insert_chunk(chunk).await.unwrap();
            chunks.push(chunk);
        }
        (BatchProposer::new(database.clone(), config), database, chunks)
    }

    #[test]
    fn test_estimate_batch_usage() {
        let chunk = Chunk {
            start_block_number: 5,
            end_block_number: 7,
            payload_size: 100,
            row_consumption: 42,
            ..Default::default()
        };

        let usage = BatchUsage::EMPTY.add(&BatchUsage::from(&chunk));

        assert_eq!(usage.chunks, 1);
        assert_eq!(usage.calldata_size, 281);
        assert_eq!(usage.proof_cost, 42);
        assert_eq!(usage.commit_gas, BASE_COMMIT_GAS + CHUNK_COMMIT_GAS + 16 * 281);
    }

    #[tokio::test]
    async fn test_should_close_before_calldata_ceiling() -> eyre::Result<()> {
        // Given: each chunk has a calldata estimate of 1 + 60 + 339 = 400 bytes.
        let (proposer, database, chunks) = setup(config(), &[339, 339, 339]).await;

        // When
        let batch = proposer.try_propose_batch_at(NOW).await?.expect("first batch");

        // Then
        assert_eq!((batch.start_chunk_index, batch.end_chunk_index), (0, 1));
        assert_eq!(batch.cost.calldata_size, 800);
        assert_eq!(batch.cost.proof_cost, 20);
        assert_eq!(batch.status, BatchStatus::Unassigned);
        assert_eq!(batch.parent_hash, B256::ZERO);
        assert_eq!(batch.post_state_root, chunks[1].post_state_root);
        assert_eq!(database.get_batch(0).await?, Some(batch.clone()));
        assert_eq!(database.get_chunk(1).await?.and_then(|c| c.batch_index), Some(0));
        assert_eq!(database.get_chunk(2).await?.and_then(|c| c.batch_index), None);

        // The remaining chunk stays open until it times out.
        assert!(proposer.try_propose_batch_at(NOW).await?.is_none());
        let next = proposer.try_propose_batch_at(NOW + 60).await?.expect("timed out batch");
        assert_eq!((next.start_chunk_index, next.end_chunk_index), (2, 2));
        assert_eq!(next.parent_hash, batch.hash);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_close_on_commit_gas() -> eyre::Result<()> {
        // Commit gas of a single 61-byte chunk: 100000 + 5000 + 16 * 61 = 105976.
        let config = BatchProposerConfig { max_commit_gas_per_batch: 110_000, ..config() };
        let (proposer, _database, _) = setup(config, &[0, 0]).await;

        let batch = proposer.try_propose_batch_at(NOW).await?.expect("batch");

        assert_eq!(batch.num_chunks(), 1);
        assert_eq!(batch.cost.commit_gas, 105_976);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_propose_oversized_chunk_alone() -> eyre::Result<()> {
        let (proposer, _database, _) = setup(config(), &[5_000, 1]).await;

        let batch = proposer.try_propose_batch_at(NOW).await?.expect("oversized batch");

        assert_eq!(batch.num_chunks(), 1);
        assert!(batch.cost.calldata_size > 1_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_reject_state_root_mismatch() -> eyre::Result<()> {
        // Given
        let (proposer, database, _) = setup(config(), &[1]).await;
        let mut block = random!(L2Block);
        block.number = 1;
        let chunk = Chunk::from_blocks(1, random!(B256), std::slice::from_ref(&block), NOW).unwrap();
        database.upsert_l2_block(block).await?;
        database.insert_chunk(chunk).await?;

        // When
        let err = proposer.try_propose_batch_at(NOW + 60).await.unwrap_err();

        // Then
        assert!(matches!(err, ProposerError::StateRootMismatch { index: 1, .. }));
        assert!(err.is_fatal());
        assert!(database.get_last_batch().await?.is_none());

        Ok(())
    }
}
