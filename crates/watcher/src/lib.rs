//! L2 watcher for the rollup relayer.

mod contract;
pub use contract::{AppendMessage, SentMessage};

mod error;
pub use error::{FilterLogError, L2WatcherError};

mod metrics;
pub use metrics::L2WatcherMetrics;

use alloy_primitives::Address;
use alloy_rpc_types_eth::Log;
use alloy_sol_types::SolEvent;
use error::L2WatcherResult;
use futures::StreamExt;
use rollup_relayer_primitives::{L2Block, L2Message};
use rollup_relayer_providers::L2Provider;
use scroll_db::{Database, DatabaseOperations};
use std::{sync::Arc, time::Instant};

/// The number of blocks requested from the L2 node concurrently.
const BLOCK_FETCH_CONCURRENCY: usize = 8;

/// The configuration of the [`L2Watcher`].
#[derive(Debug, Clone, Copy)]
pub struct L2WatcherConfig {
    /// The number of blocks behind the L2 tip at which a block is considered final.
    pub confirmations: u64,
    /// The first block to record when the database is empty.
    pub start_block: u64,
    /// The maximum number of blocks recorded per call.
    pub fetch_limit: u64,
    /// The address of the L2 message queue, the only emitter of [`AppendMessage`] logs.
    pub message_queue: Address,
    /// The address of the L2 messenger, the only emitter of [`SentMessage`] logs.
    pub messenger: Address,
}

impl Default for L2WatcherConfig {
    fn default() -> Self {
        Self {
            confirmations: 0,
            start_block: 0,
            fetch_limit: 100,
            message_queue: Address::ZERO,
            messenger: Address::ZERO,
        }
    }
}

/// Records every confirmed L2 block, along with the L2 to L1 messages it contains, in the
/// database.
///
/// Progress is tracked by a watermark persisted with the blocks, so a restarted watcher resumes
/// after the last recorded block.
#[derive(Debug)]
pub struct L2Watcher<P> {
    /// The L2 provider.
    provider: P,
    /// The database.
    database: Arc<Database>,
    /// The watcher configuration.
    config: L2WatcherConfig,
    /// The watcher metrics.
    metrics: L2WatcherMetrics,
}

impl<P> L2Watcher<P>
where
    P: L2Provider,
{
    /// Returns a new [`L2Watcher`].
    pub fn new(provider: P, database: Arc<Database>, config: L2WatcherConfig) -> Self {
        Self { provider, database, config, metrics: L2WatcherMetrics::default() }
    }

    /// Returns the highest L2 block at the configured confirmation depth.
    pub async fn latest_confirmed_block_number(&self) -> L2WatcherResult<u64> {
        let tip = self.provider.tip_number().await?;
        let confirmed = tip.saturating_sub(self.config.confirmations);
        self.metrics.last_confirmed_height.set(confirmed as f64);
        Ok(confirmed)
    }

    /// Records the blocks up to the latest confirmed block. Returns the new watermark if any
    /// block was recorded.
    #[tracing::instrument(target = "scroll::watcher", skip_all)]
    pub async fn step(&self) -> L2WatcherResult<Option<u64>> {
        let confirmed = self.latest_confirmed_block_number().await?;
        self.try_fetch_missing_blocks(confirmed).await
    }

    /// Records the blocks after the watermark, up to `confirmed` and at most
    /// [`L2WatcherConfig::fetch_limit`] of them. Returns the new watermark if any block was
    /// recorded.
    ///
    /// Only the contiguous prefix of the range that the L2 node returns is recorded.
    #[tracing::instrument(target = "scroll::watcher", skip_all, fields(confirmed))]
    pub async fn try_fetch_missing_blocks(&self, confirmed: u64) -> L2WatcherResult<Option<u64>> {
        let persisted = self.database.get_l2_watermark().await?;
        let watermark = match persisted {
            Some(watermark) => Some(watermark),
            None => self.database.get_highest_l2_block().await?.map(|b| b.number),
        };
        let from = watermark.map_or(self.config.start_block, |w| w + 1);
        if confirmed < from {
            tracing::trace!(target: "scroll::watcher", ?watermark, confirmed, "no new confirmed blocks");
            return Ok(None);
        }
        let to = confirmed.min(from + self.config.fetch_limit.max(1) - 1);

        let start = Instant::now();
        let blocks = self.fetch_blocks(from, to).await?;
        let Some(last) = blocks.last().map(|b| b.number) else {
            tracing::debug!(target: "scroll::watcher", from, "l2 node returned no blocks");
            return Ok(None);
        };
        self.check_continuity(&blocks).await?;

        let logs = self.provider.logs(from, last).await?;
        let messages = self.handle_logs(&logs)?;

        let tx = self.database.tx_mut().await?;
        for block in &blocks {
            tx.upsert_l2_block(block.clone()).await?;
        }
        for message in &messages {
            tx.upsert_l2_message(*message).await?;
        }
        tx.compare_and_set_l2_watermark(persisted, last).await?;
        tx.commit().await?;

        self.metrics.blocks_watched.increment(blocks.len() as u64);
        self.metrics.messages_watched.increment(messages.len() as u64);
        self.metrics.fetch_duration.record(start.elapsed().as_secs_f64());
        tracing::info!(target: "scroll::watcher", from, to = last, messages = messages.len(), "recorded l2 blocks");

        Ok(Some(last))
    }

    /// Fetches the blocks `[from, to]`, stopping at the first block the node does not return.
    ///
    /// An RPC failure after the first block ends the range early; it only surfaces if no block
    /// could be fetched.
    async fn fetch_blocks(&self, from: u64, to: u64) -> L2WatcherResult<Vec<L2Block>> {
        let mut stream = futures::stream::iter(from..=to)
            .map(|number| self.provider.block(number))
            .buffered(BLOCK_FETCH_CONCURRENCY);

        let mut blocks = Vec::with_capacity((to - from + 1) as usize);
        while let Some(result) = stream.next().await {
            let expected = from + blocks.len() as u64;
            match result {
                Ok(Some(block)) if block.number == expected => blocks.push(block),
                Ok(Some(block)) => {
                    return Err(L2WatcherError::UnexpectedBlock { expected, got: block.number })
                }
                Ok(None) => {
                    tracing::debug!(target: "scroll::watcher", number = expected, "block not available yet");
                    break;
                }
                Err(err) if blocks.is_empty() => return Err(err.into()),
                Err(err) => {
                    tracing::warn!(target: "scroll::watcher", number = expected, ?err, "failed to fetch block, recording prefix");
                    break;
                }
            }
        }
        Ok(blocks)
    }

    /// Checks that `blocks` form a chain extending the recorded chain, and that no recorded block
    /// of the range has a different hash.
    async fn check_continuity(&self, blocks: &[L2Block]) -> L2WatcherResult<()> {
        let Some(first) = blocks.first() else { return Ok(()) };

        if let Some(parent) = match first.number.checked_sub(1) {
            Some(number) => self.database.get_l2_block(number).await?,
            None => None,
        } {
            if first.parent_hash != parent.hash {
                return Err(L2WatcherError::ParentHashMismatch {
                    number: first.number,
                    expected: parent.hash,
                    got: first.parent_hash,
                });
            }
        }

        for pair in blocks.windows(2) {
            if !pair[1].is_child_of(&pair[0]) {
                return Err(L2WatcherError::ParentHashMismatch {
                    number: pair[1].number,
                    expected: pair[0].hash,
                    got: pair[1].parent_hash,
                });
            }
        }

        let recorded = self.database.get_l2_blocks(first.number, blocks.len() as u64).await?;
        for stored in recorded {
            let Some(fetched) = blocks.iter().find(|b| b.number == stored.number) else {
                continue;
            };
            if fetched.hash != stored.hash {
                return Err(L2WatcherError::ParentHashMismatch {
                    number: stored.number,
                    expected: stored.hash,
                    got: fetched.hash,
                });
            }
        }

        Ok(())
    }

    /// Decodes the rollup logs into the [`L2Message`]s they append.
    #[tracing::instrument(skip_all)]
    fn handle_logs(&self, logs: &[Log]) -> L2WatcherResult<Vec<L2Message>> {
        let mut messages = Vec::new();

        for log in logs {
            let address = log.address();
            match log.topics().first() {
                Some(&AppendMessage::SIGNATURE_HASH) if address == self.config.message_queue => {
                    let event = AppendMessage::decode_log(&log.inner)
                        .map_err(|error| FilterLogError::DecodeLogFailed {
                            log_type: "AppendMessage",
                            error,
                        })?
                        .data;
                    let block_number =
                        log.block_number.ok_or(FilterLogError::MissingBlockNumber)?;
                    let tx_hash =
                        log.transaction_hash.ok_or(FilterLogError::MissingTransactionHash)?;
                    let queue_index =
                        event.index.try_into().map_err(|_| FilterLogError::InvalidQueueIndex)?;

                    tracing::trace!(target: "scroll::watcher", queue_index, message_hash = ?event.messageHash, "appended message");
                    messages.push(L2Message {
                        queue_index,
                        message_hash: event.messageHash,
                        block_number,
                        tx_hash,
                    });
                }
                Some(&SentMessage::SIGNATURE_HASH) if address == self.config.messenger => {
                    self.metrics.messages_sent.increment(1)
                }
                _ => {
                    tracing::trace!(target: "scroll::watcher", ?address, "skipped log");
                }
            }
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use alloy_primitives::{Address, LogData, B256, U256};
    use alloy_sol_types::SolEvent;
    use rollup_relayer_primitives::random;
    use rollup_relayer_providers::test_utils::MockL2Provider;
    use scroll_db::test_utils::setup_test_db;

    fn chain(len: u64) -> Vec<L2Block> {
        let mut parent = B256::ZERO;
        (0..len)
            .map(|number| {
                let mut block = random!(L2Block);
                block.number = number;
                block.parent_hash = parent;
                parent = block.hash;
                block
            })
            .collect()
    }

    const MESSAGE_QUEUE: Address = Address::repeat_byte(1);

    fn append_message_log(address: Address, index: u64, block_number: u64) -> Log {
        let event = AppendMessage { index: U256::from(index), messageHash: random!(B256) };
        Log {
            inner: alloy_primitives::Log {
                address,
                data: event.encode_log_data(),
            },
            block_number: Some(block_number),
            transaction_hash: Some(random!(B256)),
            ..Default::default()
        }
    }

    async fn watcher(
        config: L2WatcherConfig,
    ) -> (L2Watcher<Arc<MockL2Provider>>, Arc<MockL2Provider>, Arc<Database>) {
        let provider = Arc::new(MockL2Provider::default());
        let database = Arc::new(setup_test_db().await);
        (L2Watcher::new(provider.clone(), database.clone(), config), provider, database)
    }

    #[tokio::test]
    async fn test_should_apply_confirmation_depth() -> eyre::Result<()> {
        // Given
        let config = L2WatcherConfig { confirmations: 3, ..Default::default() };
        let (watcher, provider, database) = watcher(config).await;
        provider.extend(chain(10));

        // When
        let watermark = watcher.step().await?;

        // Then
        assert_eq!(watcher.latest_confirmed_block_number().await?, 6);
        assert_eq!(watermark, Some(6));
        assert_eq!(database.get_l2_watermark().await?, Some(6));
        assert_eq!(database.get_highest_l2_block().await?.map(|b| b.number), Some(6));

        // A second call with no new confirmed block is a no-op.
        assert_eq!(watcher.step().await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_fetch_in_windows() -> eyre::Result<()> {
        // Given
        let config = L2WatcherConfig { fetch_limit: 4, ..Default::default() };
        let (watcher, provider, database) = watcher(config).await;
        provider.extend(chain(10));

        // When
        let mut watermarks = Vec::new();
        while let Some(watermark) = watcher.step().await? {
            watermarks.push(watermark);
        }

        // Then
        assert_eq!(watermarks, vec![3, 7, 9]);
        assert_eq!(database.get_l2_blocks(0, 100).await?.len(), 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_record_contiguous_prefix() -> eyre::Result<()> {
        // Given
        let (watcher, provider, database) = watcher(L2WatcherConfig::default()).await;
        let blocks = chain(8);
        provider.extend(blocks.clone());
        provider.remove_block(5);

        // When
        let watermark = watcher.try_fetch_missing_blocks(7).await?;

        // Then
        assert_eq!(watermark, Some(4));
        assert!(database.get_l2_block(5).await?.is_none());
        assert!(database.get_l2_block(6).await?.is_none());

        // The missing block shows up and the watcher resumes after the watermark.
        provider.extend([blocks[5].clone()]);
        assert_eq!(watcher.try_fetch_missing_blocks(7).await?, Some(7));

        Ok(())
    }

    #[tokio::test]
    async fn test_should_surface_error_without_progress() -> eyre::Result<()> {
        let (watcher, provider, database) = watcher(L2WatcherConfig::default()).await;
        provider.extend(chain(4));
        provider.fail_block(0);

        let err = watcher.step().await.unwrap_err();

        assert!(matches!(err, L2WatcherError::Provider(_)));
        assert!(!err.is_fatal());
        assert_eq!(database.get_l2_watermark().await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_detect_parent_hash_mismatch() -> eyre::Result<()> {
        // Given
        let (watcher, provider, _database) = watcher(L2WatcherConfig::default()).await;
        let blocks = chain(6);
        provider.extend(blocks[..3].iter().cloned());
        watcher.step().await?;

        // When
        let mut forked = blocks[3].clone();
        forked.parent_hash = random!(B256);
        provider.extend([forked, blocks[4].clone(), blocks[5].clone()]);
        let err = watcher.step().await.unwrap_err();

        // Then
        assert!(matches!(err, L2WatcherError::ParentHashMismatch { number: 3, .. }));
        assert!(err.is_fatal());

        Ok(())
    }

    #[tokio::test]
    async fn test_should_record_messages() -> eyre::Result<()> {
        // Given
        let config = L2WatcherConfig { message_queue: MESSAGE_QUEUE, ..Default::default() };
        let (watcher, provider, database) = watcher(config).await;
        provider.extend(chain(5));
        provider.push_log(append_message_log(MESSAGE_QUEUE, 0, 1));
        provider.push_log(append_message_log(MESSAGE_QUEUE, 1, 3));
        // An identical event emitted by another contract.
        provider.push_log(append_message_log(Address::repeat_byte(3), 2, 4));
        provider.push_log(Log {
            inner: alloy_primitives::Log {
                address: Address::repeat_byte(2),
                data: LogData::new_unchecked(vec![random!(B256)], Default::default()),
            },
            block_number: Some(2),
            ..Default::default()
        });

        // When
        watcher.step().await?;

        // Then
        let messages = database.get_l2_messages_in_range(0, 4).await?;
        assert_eq!(messages.iter().map(|m| m.queue_index).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(messages[1].block_number, 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_should_resume_from_start_block() -> eyre::Result<()> {
        let config = L2WatcherConfig { start_block: 3, ..Default::default() };
        let (watcher, provider, database) = watcher(config).await;
        provider.extend(chain(6));

        assert_eq!(watcher.step().await?, Some(5));
        assert_eq!(database.get_lowest_l2_block().await?.map(|b| b.number), Some(3));

        Ok(())
    }
}
