//! Integration tests of the L2 block backfill.

use alloy_primitives::B256;
use rollup_relayer_primitives::{random, L2Block};
use rollup_relayer_providers::test_utils::MockL2Provider;
use rollup_relayer_watcher::{L2Watcher, L2WatcherConfig};
use scroll_db::{test_utils::setup_test_db, DatabaseOperations};
use std::{sync::Arc, time::Duration};

fn chain(len: u64) -> Vec<L2Block> {
    let mut parent = B256::ZERO;
    (0..len)
        .map(|number| {
            let mut block = random!(L2Block);
            block.number = number;
            block.timestamp = 1_000 + number;
            block.parent_hash = parent;
            parent = block.hash;
            block
        })
        .collect()
}

#[tokio::test]
async fn test_should_resume_after_restart() -> eyre::Result<()> {
    reth_tracing::init_test_tracing();

    // Given
    let database = Arc::new(setup_test_db().await);
    let provider = Arc::new(MockL2Provider::default());
    let blocks = chain(30);
    provider.extend(blocks.iter().cloned().take(12));
    let config =
        L2WatcherConfig { confirmations: 2, fetch_limit: 5, ..Default::default() };

    // When
    let watcher = L2Watcher::new(provider.clone(), database.clone(), config);
    while watcher.step().await?.is_some() {}
    drop(watcher);

    // Then
    assert_eq!(database.get_l2_watermark().await?, Some(9));

    // When the watcher restarts and the chain grows
    provider.extend(blocks.iter().cloned().skip(12));
    let watcher = L2Watcher::new(provider.clone(), database.clone(), config);
    while watcher.step().await?.is_some() {}

    // Then every confirmed block is recorded exactly once, without gaps
    let recorded = database.get_l2_blocks(0, 100).await?;
    assert_eq!(recorded.len(), 28);
    for (expected, block) in blocks.iter().zip(&recorded) {
        assert_eq!(expected, block);
    }
    assert_eq!(database.get_l2_watermark().await?, Some(27));

    Ok(())
}

#[tokio::test]
async fn test_should_never_pass_confirmed_height() -> eyre::Result<()> {
    reth_tracing::init_test_tracing();

    // Given
    let database = Arc::new(setup_test_db().await);
    let provider = Arc::new(MockL2Provider::default());
    provider.extend(chain(20));
    let config =
        L2WatcherConfig { confirmations: 5, fetch_limit: 100, ..Default::default() };
    let watcher = L2Watcher::new(provider.clone(), database.clone(), config);

    // When
    let watermark = watcher.try_fetch_missing_blocks(10).await?;

    // Then
    assert_eq!(watermark, Some(10));
    assert!(database.get_l2_block(11).await?.is_none());

    // Catching up to the tip stops at the confirmation depth
    assert_eq!(watcher.step().await?, Some(14));
    assert_eq!(watcher.step().await?, None);

    Ok(())
}

#[tokio::test]
async fn test_should_backfill_slow_provider() -> eyre::Result<()> {
    reth_tracing::init_test_tracing();

    // Given
    let database = Arc::new(setup_test_db().await);
    let provider = Arc::new(MockL2Provider::default());
    provider.extend(chain(16));
    provider.set_delay(Duration::from_millis(5));
    let config =
        L2WatcherConfig { confirmations: 0, fetch_limit: 16, ..Default::default() };
    let watcher = L2Watcher::new(provider, database.clone(), config);

    // When
    let watermark = watcher.step().await?;

    // Then
    assert_eq!(watermark, Some(15));
    assert_eq!(database.get_l2_blocks(0, 100).await?.len(), 16);

    Ok(())
}
