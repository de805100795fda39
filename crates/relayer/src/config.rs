use alloy_primitives::Address;
use std::time::Duration;

/// Configuration for the [`crate::L1Relayer`].
#[derive(Debug, Clone, Copy)]
pub struct L1RelayerConfig {
    /// The address of the rollup contract on L1.
    pub rollup_contract: Address,
    /// The L1 chain id.
    pub chain_id: u64,
    /// The number of L1 blocks on top of a receipt before it is considered final.
    pub confirmations: u64,
    /// The time after the latest attempt of a transaction before it is replaced.
    pub tx_timeout: Duration,
    /// The maximum number of replacements of a transaction before its batch fails.
    pub max_replacements: u64,
    /// The percentage the fees of a replacement are bumped by.
    pub escalate_multiple_percent: u64,
    /// The maximum fee per gas of any attempt, in wei.
    pub max_gas_price: u128,
    /// The priority fee per gas of a first attempt, in wei.
    pub priority_fee: u128,
    /// The gas limit of a finalize transaction.
    pub finalize_gas_limit: u64,
    /// The maximum number of new transactions submitted per scan.
    pub max_submissions_per_tick: u64,
}

impl Default for L1RelayerConfig {
    fn default() -> Self {
        Self {
            rollup_contract: Address::ZERO,
            chain_id: 1,
            confirmations: 6,
            tx_timeout: Duration::from_secs(120),
            max_replacements: 3,
            escalate_multiple_percent: 25,
            max_gas_price: 500_000_000_000,
            priority_fee: 1_000_000_000,
            finalize_gas_limit: 1_000_000,
            max_submissions_per_tick: 5,
        }
    }
}
