//! Integration tests of the coverage of the recorded blocks by chunks and batches.

use alloy_primitives::B256;
use rand::Rng;
use rollup_relayer_primitives::{random, L2Block};
use rollup_relayer_proposer::{
    BatchProposer, BatchProposerConfig, ChunkProposer, ChunkProposerConfig, ProposalTimeoutMode,
};
use scroll_db::{test_utils::setup_test_db, DatabaseOperations};
use std::{sync::Arc, time::Duration};

const BLOCKS: u64 = 300;
const GENESIS_TIME: u64 = 1_700_000_000;

fn chain(len: u64) -> Vec<L2Block> {
    let mut rng = rand::rng();
    let mut parent = B256::ZERO;
    (1..=len)
        .map(|number| {
            let mut block = random!(L2Block);
            block.number = number;
            block.parent_hash = parent;
            block.timestamp = GENESIS_TIME + number;
            block.tx_num = rng.random_range(0..20);
            block.payload_size = rng.random_range(0..3_000);
            block.row_consumption = rng.random_range(0..200_000);
            parent = block.hash;
            block
        })
        .collect()
}

#[tokio::test]
async fn test_should_cover_blocks_without_gaps_or_overlaps() -> eyre::Result<()> {
    reth_tracing::init_test_tracing();

    // Given
    let database = Arc::new(setup_test_db().await);
    let chunk_config = ChunkProposerConfig {
        max_block_num_per_chunk: 12,
        max_tx_num_per_chunk: 100,
        max_payload_size_per_chunk: 10_000,
        max_row_consumption_per_chunk: 1_000_000,
        chunk_timeout: Duration::from_secs(30),
        timeout_mode: ProposalTimeoutMode::OldestUnit,
    };
    let batch_config = BatchProposerConfig {
        max_chunk_num_per_batch: 5,
        max_calldata_size_per_batch: 25_000,
        max_proof_cost_per_batch: 3_000_000,
        max_commit_gas_per_batch: 500_000,
        batch_timeout: Duration::from_secs(120),
        timeout_mode: ProposalTimeoutMode::LastProposal,
    };
    let chunk_proposer = ChunkProposer::new(database.clone(), chunk_config);
    let batch_proposer = BatchProposer::new(database.clone(), batch_config);
    let blocks = chain(BLOCKS);

    // When blocks are recorded progressively while both proposers run
    for (i, window) in blocks.chunks(25).enumerate() {
        for block in window {
            database.upsert_l2_block(block.clone()).await?;
        }
        let now = GENESIS_TIME + 25 * (i as u64 + 1);
        while chunk_proposer.try_propose_chunk_at(now).await?.is_some() {}
        while batch_proposer.try_propose_batch_at(now).await?.is_some() {}
    }
    // and time passes long enough for every open proposal to time out
    let later = GENESIS_TIME + BLOCKS + 1_000;
    while chunk_proposer.try_propose_chunk_at(later).await?.is_some() {}
    while batch_proposer.try_propose_batch_at(later).await?.is_some() {}
    // the last batch is measured from the batches proposed just before
    while batch_proposer.try_propose_batch_at(later + 1_000).await?.is_some() {}

    // Then the chunks cover every block exactly once, under the ceilings
    let chunks = database.get_chunks(0, u32::MAX as u64).await?;
    let mut next_block = 1;
    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.index, i as u64);
        assert_eq!(chunk.start_block_number, next_block);
        next_block = chunk.end_block_number + 1;

        if chunk.num_blocks() > 1 {
            assert!(chunk.num_blocks() <= chunk_config.max_block_num_per_chunk);
            assert!(chunk.tx_num <= chunk_config.max_tx_num_per_chunk);
            assert!(chunk.payload_size <= chunk_config.max_payload_size_per_chunk);
            assert!(chunk.row_consumption <= chunk_config.max_row_consumption_per_chunk);
        }
    }
    assert_eq!(next_block, BLOCKS + 1);

    // and the batches cover every chunk exactly once, under the ceilings
    let mut next_chunk = 0;
    let mut parent_hash = B256::ZERO;
    let mut index = 0;
    while let Some(batch) = database.get_batch(index).await? {
        assert_eq!(batch.start_chunk_index, next_chunk);
        assert_eq!(batch.parent_hash, parent_hash);
        next_chunk = batch.end_chunk_index + 1;
        parent_hash = batch.hash;
        index += 1;

        if batch.num_chunks() > 1 {
            assert!(batch.num_chunks() <= batch_config.max_chunk_num_per_batch);
            assert!(batch.cost.calldata_size <= batch_config.max_calldata_size_per_batch);
            assert!(batch.cost.proof_cost <= batch_config.max_proof_cost_per_batch);
            assert!(batch.cost.commit_gas <= batch_config.max_commit_gas_per_batch);
        }
    }
    assert_eq!(next_chunk, chunks.len() as u64);
    for chunk in database.get_chunks(0, u32::MAX as u64).await? {
        assert!(chunk.batch_index.is_some());
    }

    Ok(())
}

#[tokio::test]
async fn test_should_split_forty_percent_blocks() -> eyre::Result<()> {
    // Given three blocks each using 40% of the payload ceiling
    let database = Arc::new(setup_test_db().await);
    let config = ChunkProposerConfig {
        max_payload_size_per_chunk: 1_000,
        chunk_timeout: Duration::from_secs(10),
        ..Default::default()
    };
    let proposer = ChunkProposer::new(database.clone(), config);
    let mut blocks = chain(3);
    for block in &mut blocks {
        block.payload_size = 400;
        block.tx_num = 1;
        block.row_consumption = 1;
        database.upsert_l2_block(block.clone()).await?;
    }

    // When
    let now = GENESIS_TIME + 3;
    let first = proposer.try_propose_chunk_at(now).await?.expect("first chunk");
    let pending = proposer.try_propose_chunk_at(now).await?;
    let second = proposer.try_propose_chunk_at(now + 10).await?.expect("second chunk");

    // Then
    assert_eq!((first.start_block_number, first.end_block_number), (1, 2));
    assert_eq!(first.payload_size, 800);
    assert!(pending.is_none());
    assert_eq!((second.start_block_number, second.end_block_number), (3, 3));
    assert_eq!(second.payload_size, 400);

    Ok(())
}
