//! End to end tests of the rollup relayer against mock L1 and L2 nodes.

use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_signer_local::PrivateKeySigner;
use rollup_relayer::{RollupRelayer, RollupRelayerConfig, UnitIntervals};
use rollup_relayer_l1::L1RelayerConfig;
use rollup_relayer_primitives::{random, BatchStatus, L2Block};
use rollup_relayer_proposer::{BatchProposerConfig, ChunkProposerConfig};
use rollup_relayer_providers::test_utils::{MockL1Provider, MockL2Provider};
use scroll_db::{test_utils::setup_test_db, DatabaseOperations};
use std::{future::Future, sync::Arc, time::Duration};

const GENESIS_TIME: u64 = 1_600_000_000;

fn chain(len: u64) -> Vec<L2Block> {
    let mut parent = B256::ZERO;
    (0..len)
        .map(|number| {
            let mut block = random!(L2Block);
            block.number = number;
            block.parent_hash = parent;
            block.timestamp = GENESIS_TIME + number;
            block.tx_num = 1;
            block.payload_size = 100;
            block.row_consumption = 100;
            parent = block.hash;
            block
        })
        .collect()
}

fn config() -> RollupRelayerConfig {
    let tick = Duration::from_millis(20);
    RollupRelayerConfig {
        chunk_proposer: ChunkProposerConfig {
            max_block_num_per_chunk: 4,
            chunk_timeout: Duration::ZERO,
            ..Default::default()
        },
        batch_proposer: BatchProposerConfig {
            max_chunk_num_per_batch: 2,
            batch_timeout: Duration::ZERO,
            ..Default::default()
        },
        relayer: L1RelayerConfig {
            rollup_contract: Address::repeat_byte(0xaa),
            chain_id: 1337,
            confirmations: 0,
            ..Default::default()
        },
        intervals: UnitIntervals {
            watcher: tick,
            chunk_proposer: tick,
            batch_proposer: tick,
            commit_scan: tick,
            finalize_scan: tick,
        },
        shutdown_timeout: Duration::from_secs(2),
        import_genesis: true,
        ..Default::default()
    }
}

/// Polls `done` until it holds, including every broadcast transaction on L1 meanwhile.
async fn wait_until<F, Fut>(l1: &MockL1Provider, mut done: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = eyre::Result<bool>>,
{
    let poll = async {
        loop {
            for raw in l1.sent_transactions() {
                l1.include(keccak256(&raw), 1, true);
            }
            if done().await.unwrap() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(20), poll).await.expect("condition not reached");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_should_commit_and_finalize_l2_blocks() -> eyre::Result<()> {
    reth_tracing::init_test_tracing();

    // Given an L2 chain of 16 blocks on top of genesis
    let database = Arc::new(setup_test_db().await);
    let l2 = Arc::new(MockL2Provider::default());
    l2.extend(chain(17));
    let l1 = Arc::new(MockL1Provider::default());
    l1.set_head(1);
    l1.set_gas_price(10_000_000_000);
    let signer = Arc::new(PrivateKeySigner::from_bytes(&B256::repeat_byte(0x22))?);

    // When the relayer runs
    let relayer =
        RollupRelayer::start(l2.clone(), l1.clone(), signer, database.clone(), config()).await?;

    // Then every block ends up in a committed batch
    wait_until(&l1, || async {
        let Some(last) = database.get_last_batch().await? else { return Ok(false) };
        let status = relayer.status().await?;
        let committed = status.batch_count(BatchStatus::Committed) == last.index;
        Ok::<_, eyre::Report>(last.end_block_number == 16 && committed)
    })
    .await;
    let status = relayer.status().await?;
    assert_eq!(status.watermark, Some(16));
    assert_eq!(status.batch_count(BatchStatus::Finalized), 1);
    assert!(status.is_healthy());

    let last = database.get_last_batch().await?.unwrap();
    let mut next_block = 1;
    for index in 1..=last.index {
        let batch = database.get_batch(index).await?.unwrap();
        assert_eq!(batch.start_block_number, next_block);
        assert!(batch.num_chunks() <= 2);
        next_block = batch.end_block_number + 1;
    }
    for chunk in database.get_chunks(1, 16).await? {
        assert!(chunk.num_blocks() <= 4);
    }

    // When the proofs are delivered
    for index in 1..=last.index {
        relayer.submit_proof(index, Bytes::from(vec![index as u8; 32])).await?;
    }

    // Then every batch is finalized
    wait_until(&l1, || async {
        let status = relayer.status().await?;
        Ok::<_, eyre::Report>(status.batch_count(BatchStatus::Finalized) == last.index + 1)
    })
    .await;
    assert_eq!(l1.sent_transactions().len() as u64, 2 * last.index);
    assert!(database.get_pending_rollup_transactions().await?.is_empty());

    relayer.close().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_should_report_closing_status() -> eyre::Result<()> {
    // Given a relayer with nothing to do
    let database = Arc::new(setup_test_db().await);
    let l2 = Arc::new(MockL2Provider::default());
    l2.extend(chain(1));
    let l1 = Arc::new(MockL1Provider::default());
    let signer = Arc::new(PrivateKeySigner::from_bytes(&B256::repeat_byte(0x22))?);
    let relayer = RollupRelayer::start(l2, l1, signer, database.clone(), config()).await?;

    // Then the genesis is imported
    let status = relayer.status().await?;
    assert_eq!(status.watermark, Some(0));
    assert_eq!(status.batch_count(BatchStatus::Finalized), 1);
    assert!(status.halted.is_empty());

    // And closing returns without transactions in flight
    relayer.close().await?;
    Ok(())
}
