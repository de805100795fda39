use crate::RollupRelayerError;

use parking_lot::Mutex;
use std::{collections::BTreeSet, future::Future, sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// The independently scheduled units of the rollup relayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum RelayerUnit {
    /// The L2 watcher.
    Watcher,
    /// The chunk proposer.
    ChunkProposer,
    /// The batch proposer.
    BatchProposer,
    /// The commit scan of the L1 relayer.
    CommitScan,
    /// The finalize scan of the L1 relayer.
    FinalizeScan,
}

/// The units that stopped after a fatal error.
pub(crate) type HaltedUnits = Arc<Mutex<BTreeSet<RelayerUnit>>>;

/// Spawns a task calling `tick` every `period` until `cancel` fires or a tick fails with a fatal
/// error.
///
/// Ticks never overlap: missed ticks are skipped while a tick runs. A tick that already started
/// runs to completion on cancellation.
pub(crate) fn spawn_unit<F, Fut>(
    unit: RelayerUnit,
    period: Duration,
    cancel: CancellationToken,
    halted: HaltedUnits,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), RollupRelayerError>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tracing::info!(target: "rollup_relayer::node", %unit, ?period, "starting unit");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            match tick().await {
                Ok(()) => {}
                Err(err) if err.is_fatal() => {
                    tracing::error!(target: "rollup_relayer::node", %unit, %err, "fatal error, halting unit");
                    halted.lock().insert(unit);
                    return;
                }
                Err(err) => {
                    tracing::warn!(target: "rollup_relayer::node", %unit, %err, "tick failed, retrying next tick");
                }
            }
        }

        tracing::info!(target: "rollup_relayer::node", %unit, "unit stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scroll_db::DatabaseError;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_unit_retries_transient_errors() {
        let halted = HaltedUnits::default();
        let cancel = CancellationToken::new();
        let ticks = Arc::new(AtomicU64::new(0));

        let counter = ticks.clone();
        let handle = spawn_unit(
            RelayerUnit::Watcher,
            Duration::from_secs(1),
            cancel.clone(),
            halted.clone(),
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::Relaxed);
                    let err = DatabaseError::DatabaseError(sea_orm_err());
                    Err::<(), RollupRelayerError>(err.into())
                }
            },
        );

        tokio::time::sleep(Duration::from_millis(4_500)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(ticks.load(Ordering::Relaxed), 5);
        assert!(halted.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unit_halts_on_fatal_error() {
        let halted = HaltedUnits::default();
        let ticks = Arc::new(AtomicU64::new(0));

        let counter = ticks.clone();
        let handle = spawn_unit(
            RelayerUnit::BatchProposer,
            Duration::from_secs(1),
            CancellationToken::new(),
            halted.clone(),
            move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::Relaxed);
                    Err::<(), RollupRelayerError>(RollupRelayerError::MissingGenesis)
                }
            },
        );

        handle.await.unwrap();

        assert_eq!(ticks.load(Ordering::Relaxed), 1);
        assert!(halted.lock().contains(&RelayerUnit::BatchProposer));
    }

    fn sea_orm_err() -> scroll_db::DbErr {
        scroll_db::DbErr::Custom("connection reset".to_string())
    }
}
