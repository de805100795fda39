//! Fees of the first attempt of a transaction and of its replacements.

use crate::L1RelayerConfig;
use rollup_relayer_primitives::GasParams;

/// The buffer added on top of the estimated commit gas, in percent.
pub const COMMIT_GAS_LIMIT_BUFFER_PERCENT: u64 = 20;

/// The gas limit of a cancellation, a plain transfer.
pub const CANCELLATION_GAS_LIMIT: u64 = 21_000;

/// Returns the gas limit of a commit transaction with an estimated `commit_gas`.
pub const fn commit_gas_limit(commit_gas: u64) -> u64 {
    commit_gas.saturating_add(commit_gas.saturating_mul(COMMIT_GAS_LIMIT_BUFFER_PERCENT) / 100)
}

/// Returns the fees of a first attempt at the current L1 `gas_price`, capped at the configured
/// maximum gas price.
pub fn initial_gas(gas_price: u128, gas_limit: u64, config: &L1RelayerConfig) -> GasParams {
    let max_fee_per_gas = gas_price.saturating_add(config.priority_fee).min(config.max_gas_price);
    GasParams {
        gas_limit,
        max_fee_per_gas,
        max_priority_fee_per_gas: config.priority_fee.min(max_fee_per_gas),
    }
}

/// Returns the fees of a replacement of an attempt with `previous` fees.
///
/// Both fees are bumped by the configured percentage, by at least one wei, and the fee cap
/// follows the current L1 `gas_price` if it is higher. Returns [`None`] if the maximum gas price
/// does not leave room for a strictly higher fee.
pub fn bump_gas(
    previous: &GasParams,
    gas_price: u128,
    config: &L1RelayerConfig,
) -> Option<GasParams> {
    let bump = |value: u128| {
        let bumped = value.saturating_mul(100 + config.escalate_multiple_percent as u128) / 100;
        bumped.max(value.saturating_add(1))
    };

    let max_fee_per_gas = bump(previous.max_fee_per_gas)
        .max(gas_price.saturating_add(config.priority_fee))
        .min(config.max_gas_price);
    if max_fee_per_gas <= previous.max_fee_per_gas {
        return None;
    }
    let max_priority_fee_per_gas = bump(previous.max_priority_fee_per_gas).min(max_fee_per_gas);

    Some(GasParams { gas_limit: previous.gas_limit, max_fee_per_gas, max_priority_fee_per_gas })
}

/// Returns the fees of a cancellation replacing an attempt with `previous` fees at the same
/// nonce, or [`None`] if the maximum gas price leaves no room for a replacement.
pub fn cancellation_gas(
    previous: &GasParams,
    gas_price: u128,
    config: &L1RelayerConfig,
) -> Option<GasParams> {
    bump_gas(previous, gas_price, config)
        .map(|gas| GasParams { gas_limit: CANCELLATION_GAS_LIMIT, ..gas })
}
