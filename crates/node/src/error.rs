use rollup_relayer_l1::RelayerError;
use rollup_relayer_proposer::ProposerError;
use rollup_relayer_providers::ProviderError;
use rollup_relayer_watcher::L2WatcherError;
use scroll_db::DatabaseError;

/// An error of the rollup relayer or one of its units.
#[derive(Debug, thiserror::Error)]
pub enum RollupRelayerError {
    /// An error of the L2 watcher.
    #[error(transparent)]
    Watcher(#[from] L2WatcherError),
    /// An error of the chunk or batch proposer.
    #[error(transparent)]
    Proposer(#[from] ProposerError),
    /// An error of the L1 relayer.
    #[error(transparent)]
    Relayer(#[from] RelayerError),
    /// A provider error outside of the units.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    /// A database error outside of the units.
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// The L2 node does not have the genesis block.
    #[error("l2 genesis block not found")]
    MissingGenesis,
}

impl RollupRelayerError {
    /// Returns true if the unit that returned the error must stop.
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Watcher(err) => err.is_fatal(),
            Self::Proposer(err) => err.is_fatal(),
            Self::Relayer(err) => err.is_fatal(),
            Self::Database(err) => err.is_fatal(),
            Self::Provider(_) => false,
            Self::MissingGenesis => true,
        }
    }
}
