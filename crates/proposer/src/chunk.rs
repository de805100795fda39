use crate::{
    config::ChunkProposerConfig,
    error::ProposerResult,
    greedy::{self, CloseReason, Usage},
    metrics::ChunkProposerMetrics,
    ProposerError,
};

use rollup_relayer_primitives::{unix_timestamp, Chunk, L2Block};
use scroll_db::{Database, DatabaseOperations};
use std::{sync::Arc, time::Instant};

/// The resources consumed by the blocks of a chunk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChunkUsage {
    /// The number of blocks.
    pub blocks: u64,
    /// The number of transactions.
    pub txs: u64,
    /// The transaction payload size in bytes.
    pub payload_size: u64,
    /// The prover row consumption.
    pub row_consumption: u64,
}

impl From<&L2Block> for ChunkUsage {
    fn from(block: &L2Block) -> Self {
        Self {
            blocks: 1,
            txs: block.tx_num,
            payload_size: block.payload_size,
            row_consumption: block.row_consumption,
        }
    }
}

impl From<&ChunkProposerConfig> for ChunkUsage {
    fn from(config: &ChunkProposerConfig) -> Self {
        Self {
            blocks: config.max_block_num_per_chunk,
            txs: config.max_tx_num_per_chunk,
            payload_size: config.max_payload_size_per_chunk,
            row_consumption: config.max_row_consumption_per_chunk,
        }
    }
}

impl Usage for ChunkUsage {
    fn add(&self, other: &Self) -> Self {
        Self {
            blocks: self.blocks + other.blocks,
            txs: self.txs + other.txs,
            payload_size: self.payload_size + other.payload_size,
            row_consumption: self.row_consumption + other.row_consumption,
        }
    }

    fn exceeded(&self, limits: &Self) -> Option<&'static str> {
        if self.blocks > limits.blocks {
            Some("block_num")
        } else if self.txs > limits.txs {
            Some("tx_num")
        } else if self.payload_size > limits.payload_size {
            Some("payload_size")
        } else if self.row_consumption > limits.row_consumption {
            Some("row_consumption")
        } else {
            None
        }
    }
}

/// Groups the recorded L2 blocks into chunks.
///
/// Blocks are taken in height order starting after the last chunk, and accumulated until the
/// next block would cross a ceiling of the [`ChunkProposerConfig`] or the chunk times out.
#[derive(Debug)]
pub struct ChunkProposer {
    /// The database.
    database: Arc<Database>,
    /// The proposer configuration.
    config: ChunkProposerConfig,
    /// The proposer metrics.
    metrics: ChunkProposerMetrics,
}

impl ChunkProposer {
    /// Returns a new [`ChunkProposer`].
    pub fn new(database: Arc<Database>, config: ChunkProposerConfig) -> Self {
        Self { database, config, metrics: ChunkProposerMetrics::default() }
    }

    /// Proposes the next chunk if enough blocks are recorded or the oldest one timed out.
    pub async fn try_propose_chunk(&self) -> ProposerResult<Option<Chunk>> {
        self.try_propose_chunk_at(unix_timestamp()).await
    }

    /// Proposes the next chunk, measuring timeouts against `now`.
    #[tracing::instrument(target = "scroll::proposer", skip(self))]
    pub async fn try_propose_chunk_at(&self, now: u64) -> ProposerResult<Option<Chunk>> {
        let start_time = Instant::now();

        let last_chunk = self.database.get_last_chunk().await?;
        let start = match last_chunk {
            Some(chunk) => chunk.end_block_number + 1,
            None => match self.database.get_lowest_l2_block().await? {
                Some(block) => block.number,
                None => return Ok(None),
            },
        };

        let blocks =
            self.database.get_l2_blocks(start, self.config.max_block_num_per_chunk + 1).await?;
        if blocks.is_empty() {
            tracing::trace!(target: "scroll::proposer", start, "no unassigned blocks");
            return Ok(None);
        }
        check_blocks(start, last_chunk.as_ref(), &blocks)?;

        let usages = blocks.iter().map(ChunkUsage::from).collect::<Vec<_>>();
        let limits = ChunkUsage::from(&self.config);
        let selection = greedy::select(&usages, ChunkUsage::default(), &limits);

        let reason = match selection.closed {
            Some(reason) => reason,
            None if self.config.timeout_mode.is_expired(
                self.config.chunk_timeout,
                now,
                blocks[0].timestamp,
                last_chunk.map(|c| c.created_at),
            ) =>
            {
                CloseReason::Timeout
            }
            None => {
                tracing::trace!(target: "scroll::proposer", start, blocks = selection.count, "chunk still open");
                return Ok(None);
            }
        };

        let index = last_chunk.map_or(0, |c| c.index + 1);
        let prev_state_root = last_chunk.map(|c| c.post_state_root).unwrap_or_default();
        let blocks = &blocks[..selection.count];
        let Some(chunk) = Chunk::from_blocks(index, prev_state_root, blocks, now) else {
            return Ok(None);
        };

        let tx = self.database.tx_mut().await?;
        let found = tx.get_last_chunk().await?.map(|c| c.index);
        let expected = last_chunk.map(|c| c.index);
        if found != expected {
            return Err(ProposerError::ConcurrentProposal { unit: "chunk", expected, found });
        }
        tx.insert_chunk(chunk).await?;
        tx.assign_l2_blocks_to_chunk(chunk.start_block_number, chunk.end_block_number, index)
            .await?;
        tx.commit().await?;

        self.metrics.record(reason, chunk.num_blocks());
        self.metrics.proposal_duration.record(start_time.elapsed().as_secs_f64());
        tracing::info!(
            target: "scroll::proposer",
            chunk_index = index,
            start = chunk.start_block_number,
            end = chunk.end_block_number,
            payload_size = selection.usage.payload_size,
            row_consumption = selection.usage.row_consumption,
            %reason,
            "proposed chunk"
        );

        Ok(Some(chunk))
    }
}

/// Checks that `blocks` start at `start`, extend the `last_chunk` and are contiguous.
fn check_blocks(start: u64, last_chunk: Option<&Chunk>, blocks: &[L2Block]) -> ProposerResult<()> {
    let Some(first) = blocks.first() else { return Ok(()) };
    if first.number != start {
        return Err(ProposerError::Gap { unit: "block", expected: start, got: first.number });
    }
    if let Some(chunk) = last_chunk {
        if first.parent_hash != chunk.end_block_hash {
            return Err(ProposerError::ParentHashMismatch {
                number: first.number,
                expected: chunk.end_block_hash,
                got: first.parent_hash,
            });
        }
    }
    for pair in blocks.windows(2) {
        let (parent, block) = (&pair[0], &pair[1]);
        if block.number != parent.number + 1 {
            return Err(ProposerError::Gap {
                unit: "block",
                expected: parent.number + 1,
                got: block.number,
            });
        }
        if block.parent_hash != parent.hash {
            return Err(ProposerError::ParentHashMismatch {
                number: block.number,
                expected: parent.hash,
                got: block.parent_hash,
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
    use rollup_relayer_primitives::random;
    use scroll_db::test_utils::setup_test_db;
    use std::time::Duration;

    const NOW: u64 = 10_000;

    fn config() -> ChunkProposerConfig {
        ChunkProposerConfig {
            max_block_num_per_chunk: 10,
            max_tx_num_per_chunk: 100,
            max_payload_size_per_chunk: 1_000,
            max_row_consumption_per_chunk: 1_000,
            chunk_timeout: Duration::from_secs(60),
            timeout_mode: ProposalTimeoutMode::OldestUnit,
        }
    }

    async fn setup(
        config: ChunkProposerConfig,
        payload_sizes: &[u64],
    ) -> (ChunkProposer, Arc<Database>, Vec<L2Block>) {
        let database = Arc::new(setup_test_db().await);
        let mut parent = B256::ZERO;
        let mut blocks = Vec::new();
        for (i, payload_size) in payload_sizes.iter().enumerate() {
            let mut block = random!(L2Block);
            block.number = i as u64 + 1;
            block.parent_hash = parent;
            block.timestamp = NOW;
            block.tx_num = 1;
            block.payload_size = *payload_size;
            block.row_consumption = 1;
            parent = block.hash;
            database.upsert_l2_block(block.clone()).await.unwrap();
            blocks.push(block);
        }
        (ChunkProposer::new(database.clone(), config), database, blocks)
    }

    #[tokio::test]
    async fn test_should_close_before_ceiling() -> eyre::Result<()> {
        // Given
        let (proposer, database, blocks) = setup(config(), &[400, 400, 400]).await;

        // When
        let first = proposer.try_propose_chunk_at(NOW).await?.expect("first chunk");
        let second = proposer.try_propose_chunk_at(NOW).await?;

        // Then
        assert_eq!((first.start_block_number, first.end_block_number), (1, 2));
        assert_eq!(first.payload_size, 800);
        assert_eq!(first.index, 0);
        assert!(second.is_none());
        assert_eq!(database.get_chunk(0).await?, Some(first));
        assert_eq!(first.end_block_hash, blocks[1].hash);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_close_on_block_count() -> eyre::Result<()> {
        let config = ChunkProposerConfig { max_block_num_per_chunk: 3, ..config() };
        let (proposer, _database, _) = setup(config, &[1; 7]).await;

        let first = proposer.try_propose_chunk_at(NOW).await?.expect("first chunk");
        let second = proposer.try_propose_chunk_at(NOW).await?.expect("second chunk");

        assert_eq!(first.num_blocks(), 3);
        assert_eq!(second.start_block_number, 4);
        assert_eq!(second.num_blocks(), 3);
        assert_eq!(second.prev_state_root, first.post_state_root);

        // The last block stays unassigned until it times out.
        assert!(proposer.try_propose_chunk_at(NOW).await?.is_none());
        let last = proposer.try_propose_chunk_at(NOW + 60).await?.expect("timed out chunk");
        assert_eq!((last.start_block_number, last.end_block_number), (7, 7));

        Ok(())
    }

    #[tokio::test]
    async fn test_should_propose_oversized_block_alone() -> eyre::Result<()> {
        let (proposer, _database, _) = setup(config(), &[1_500, 10]).await;

        let chunk = proposer.try_propose_chunk_at(NOW).await?.expect("oversized chunk");

        assert_eq!(chunk.num_blocks(), 1);
        assert_eq!(chunk.payload_size, 1_500);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_close_on_last_proposal_timeout() -> eyre::Result<()> {
        // Given
        let config = ChunkProposerConfig {
            max_block_num_per_chunk: 2,
            timeout_mode: ProposalTimeoutMode::LastProposal,
            ..config()
        };
        let (proposer, database, _) = setup(config, &[1, 1, 1]).await;
        let first = proposer.try_propose_chunk_at(NOW + 100).await?.expect("first chunk");
        assert_eq!(first.created_at, NOW + 100);

        // When the block is older than the timeout, but the last proposal is recent
        let chunk = proposer.try_propose_chunk_at(NOW + 120).await?;

        // Then
        assert!(chunk.is_none());
        let chunk = proposer.try_propose_chunk_at(NOW + 160).await?.expect("timed out chunk");
        assert_eq!(chunk.start_block_number, 3);
        assert_eq!(database.get_l2_block(3).await?.map(|b| b.number), Some(3));

        Ok(())
    }

    #[tokio::test]
    async fn test_should_reject_gap() -> eyre::Result<()> {
        // Given
        let (proposer, database, blocks) = setup(config(), &[1, 1]).await;
        let mut orphan = random!(L2Block);
        orphan.number = 4;
        orphan.parent_hash = blocks[1].hash;
        database.upsert_l2_block(orphan).await?;

        // When
        let err = proposer.try_propose_chunk_at(NOW + 60).await.unwrap_err();

        // Then
        assert!(matches!(err, ProposerError::Gap { unit: "block", expected: 3, got: 4 }));
        assert!(err.is_fatal());
        assert!(database.get_last_chunk().await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_should_reject_parent_hash_mismatch() -> eyre::Result<()> {
        // Given
        let config = ChunkProposerConfig { max_block_num_per_chunk: 1, ..config() };
        let (proposer, database, _) = setup(config, &[1, 1]).await;
        proposer.try_propose_chunk_at(NOW).await?;
        let mut forked = database.get_l2_block(2).await?.expect("block 2");
        forked.parent_hash = random!(B256);
        database.upsert_l2_block(forked).await?;

        // When
        let err = proposer.try_propose_chunk_at(NOW + 60).await.unwrap_err();

        // Then
        assert!(matches!(err, ProposerError::ParentHashMismatch { number: 2, .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_should_do_nothing_without_blocks() -> eyre::Result<()> {
        let (proposer, _database, _) = setup(config(), &[]).await;
        assert!(proposer.try_propose_chunk_at(NOW).await?.is_none());
        Ok(())
    }
}
