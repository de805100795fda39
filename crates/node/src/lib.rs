//! The rollup relayer node: runs the L2 watcher, the chunk and batch proposers and the two scans
//! of the L1 relayer as independently scheduled units sharing one database.

use alloy_primitives::Bytes;
use futures::future::join_all;
use rollup_relayer_l1::{L1Relayer, L1RelayerConfig, SharedTxSigner};
use rollup_relayer_primitives::unix_timestamp;
use rollup_relayer_proposer::{
    BatchProposer, BatchProposerConfig, ChunkProposer, ChunkProposerConfig,
};
use rollup_relayer_providers::{L1Provider, L2Provider};
use rollup_relayer_watcher::{L2Watcher, L2WatcherConfig};
use scroll_db::{Database, DatabaseOperations};
use std::{sync::Arc, time::Duration};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub mod args;
pub use args::RollupRelayerArgs;

mod constants;

mod error;
pub use error::RollupRelayerError;

mod status;
pub use status::RollupRelayerStatus;

mod task;
use task::{spawn_unit, HaltedUnits};
pub use task::RelayerUnit;

/// The interval of each unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitIntervals {
    /// The interval between two L2 watcher ticks.
    pub watcher: Duration,
    /// The interval between two chunk proposer ticks.
    pub chunk_proposer: Duration,
    /// The interval between two batch proposer ticks.
    pub batch_proposer: Duration,
    /// The interval between two commit scans.
    pub commit_scan: Duration,
    /// The interval between two finalize scans.
    pub finalize_scan: Duration,
}

impl Default for UnitIntervals {
    fn default() -> Self {
        Self {
            watcher: constants::WATCHER_INTERVAL,
            chunk_proposer: constants::CHUNK_PROPOSER_INTERVAL,
            batch_proposer: constants::BATCH_PROPOSER_INTERVAL,
            commit_scan: constants::COMMIT_SCAN_INTERVAL,
            finalize_scan: constants::FINALIZE_SCAN_INTERVAL,
        }
    }
}

/// The configuration of the [`RollupRelayer`].
#[derive(Debug, Clone, Copy)]
pub struct RollupRelayerConfig {
    /// The L2 watcher configuration.
    pub watcher: L2WatcherConfig,
    /// The chunk proposer configuration.
    pub chunk_proposer: ChunkProposerConfig,
    /// The batch proposer configuration.
    pub batch_proposer: BatchProposerConfig,
    /// The L1 relayer configuration.
    pub relayer: L1RelayerConfig,
    /// The interval of each unit.
    pub intervals: UnitIntervals,
    /// The bound on how long in-flight transactions are followed on shutdown.
    pub shutdown_timeout: Duration,
    /// Whether to import the L2 genesis block on first start.
    pub import_genesis: bool,
}

impl Default for RollupRelayerConfig {
    fn default() -> Self {
        Self {
            watcher: L2WatcherConfig::default(),
            chunk_proposer: ChunkProposerConfig::default(),
            batch_proposer: BatchProposerConfig::default(),
            relayer: L1RelayerConfig::default(),
            intervals: UnitIntervals::default(),
            shutdown_timeout: constants::SHUTDOWN_TIMEOUT,
            import_genesis: false,
        }
    }
}

/// A running rollup relayer.
///
/// Dropping it leaves the units running until the runtime shuts down; call
/// [`RollupRelayer::close`] for an ordered shutdown.
#[derive(Debug)]
pub struct RollupRelayer<P> {
    /// The database shared by the units.
    database: Arc<Database>,
    /// The L1 relayer, shared by the commit and finalize scans.
    relayer: Arc<L1Relayer<P>>,
    /// Stops the scheduling of the units.
    cancel: CancellationToken,
    /// The tasks running the units.
    tasks: Vec<JoinHandle<()>>,
    /// The units stopped by a fatal error.
    halted: HaltedUnits,
    /// The bound on how long in-flight transactions are followed on shutdown.
    shutdown_timeout: Duration,
}

impl<P> RollupRelayer<P>
where
    P: L1Provider + 'static,
{
    /// Starts the units of the rollup relayer.
    ///
    /// The database must be migrated. The nonce counter of the relayer account is synchronized
    /// with L1, and the L2 genesis block is imported if configured, before any unit starts.
    pub async fn start<L2>(
        l2_provider: L2,
        l1_provider: P,
        signer: SharedTxSigner,
        database: Arc<Database>,
        config: RollupRelayerConfig,
    ) -> Result<Self, RollupRelayerError>
    where
        L2: L2Provider + 'static,
    {
        if config.import_genesis {
            import_genesis(&l2_provider, &database).await?;
        }

        let relayer =
            Arc::new(L1Relayer::new(l1_provider, database.clone(), signer, config.relayer));
        relayer.initialize().await?;

        let watcher = Arc::new(L2Watcher::new(l2_provider, database.clone(), config.watcher));
        let chunk_proposer = Arc::new(ChunkProposer::new(database.clone(), config.chunk_proposer));
        let batch_proposer = Arc::new(BatchProposer::new(database.clone(), config.batch_proposer));

        let cancel = CancellationToken::new();
        let halted = HaltedUnits::default();
        let intervals = config.intervals;
        let mut tasks = Vec::with_capacity(5);

        tasks.push(spawn_unit(
            RelayerUnit::Watcher,
            intervals.watcher,
            cancel.clone(),
            halted.clone(),
            move || {
                let watcher = watcher.clone();
                async move {
                    watcher.step().await?;
                    Ok::<_, RollupRelayerError>(())
                }
            },
        ));

        tasks.push(spawn_unit(
            RelayerUnit::ChunkProposer,
            intervals.chunk_proposer,
            cancel.clone(),
            halted.clone(),
            move || {
                let proposer = chunk_proposer.clone();
                async move {
                    while proposer.try_propose_chunk().await?.is_some() {}
                    Ok::<_, RollupRelayerError>(())
                }
            },
        ));

        tasks.push(spawn_unit(
            RelayerUnit::BatchProposer,
            intervals.batch_proposer,
            cancel.clone(),
            halted.clone(),
            move || {
                let proposer = batch_proposer.clone();
                async move {
                    while proposer.try_propose_batch().await?.is_some() {}
                    Ok::<_, RollupRelayerError>(())
                }
            },
        ));

        let commit_relayer = relayer.clone();
        tasks.push(spawn_unit(
            RelayerUnit::CommitScan,
            intervals.commit_scan,
            cancel.clone(),
            halted.clone(),
            move || {
                let relayer = commit_relayer.clone();
                async move {
                    relayer.process_pending_batches().await?;
                    Ok::<_, RollupRelayerError>(())
                }
            },
        ));

        let finalize_relayer = relayer.clone();
        tasks.push(spawn_unit(
            RelayerUnit::FinalizeScan,
            intervals.finalize_scan,
            cancel.clone(),
            halted.clone(),
            move || {
                let relayer = finalize_relayer.clone();
                async move {
                    relayer.process_committed_batches().await?;
                    Ok::<_, RollupRelayerError>(())
                }
            },
        ));

        tracing::info!(target: "rollup_relayer::node", relayer = %relayer.address(), "rollup relayer started");
        Ok(Self {
            database,
            relayer,
            cancel,
            tasks,
            halted,
            shutdown_timeout: config.shutdown_timeout,
        })
    }

    /// Returns a snapshot of the progress of the relayer.
    pub async fn status(&self) -> Result<RollupRelayerStatus, RollupRelayerError> {
        Ok(RollupRelayerStatus {
            watermark: self.database.get_l2_watermark().await?,
            batches: self.database.count_batches_by_status().await?,
            halted: self.halted.lock().iter().copied().collect(),
            closing: self.cancel.is_cancelled(),
        })
    }

    /// Records the validity `proof` of the batch at `index`, making it eligible for
    /// finalization.
    pub async fn submit_proof(&self, index: u64, proof: Bytes) -> Result<(), RollupRelayerError> {
        self.database.set_batch_proof(index, proof).await?;
        tracing::info!(target: "rollup_relayer::node", batch_index = index, "recorded batch proof");
        Ok(())
    }

    /// Shuts the relayer down: stops scheduling the units, waits for the running ticks, follows
    /// the in-flight transactions for at most the shutdown timeout and closes the database.
    pub async fn close(self) -> Result<(), RollupRelayerError> {
        tracing::info!(target: "rollup_relayer::node", "closing rollup relayer");
        self.cancel.cancel();
        for result in join_all(self.tasks).await {
            if let Err(err) = result {
                tracing::error!(target: "rollup_relayer::node", ?err, "unit panicked");
            }
        }

        self.relayer.close(self.shutdown_timeout).await?;
        drop(self.relayer);

        match Arc::try_unwrap(self.database) {
            Ok(database) => database.close().await?,
            Err(_) => {
                tracing::warn!(target: "rollup_relayer::node", "database still in use, not closing")
            }
        }
        tracing::info!(target: "rollup_relayer::node", "rollup relayer closed");
        Ok(())
    }
}

/// Records the L2 genesis block as chunk 0 and batch 0 if no batch was recorded yet.
async fn import_genesis<L2: L2Provider>(
    provider: &L2,
    database: &Database,
) -> Result<(), RollupRelayerError> {
    if database.get_batch(0).await?.is_some() {
        tracing::debug!(target: "rollup_relayer::node", "genesis already imported");
        return Ok(());
    }
    let genesis = provider.block(0).await?.ok_or(RollupRelayerError::MissingGenesis)?;
    let tx = database.tx_mut().await?;
    let hash = genesis.hash;
    tx.insert_genesis(genesis, unix_timestamp()).await?;
    tx.commit().await?;
    tracing::info!(target: "rollup_relayer::node", ?hash, "imported genesis");
    Ok(())
}
