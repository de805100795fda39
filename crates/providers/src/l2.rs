use crate::ProviderError;

use alloy_eips::{eip2718::Encodable2718, BlockId, BlockNumberOrTag};
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_provider::Provider;
use alloy_rpc_types_eth::{Filter, Log, Transaction};
use rollup_relayer_primitives::L2Block;
use serde::Deserialize;

/// The EIP-2718 type of L1 message transactions, which are not part of the L2 payload.
const L1_MESSAGE_TX_TYPE: &str = "0x7e";

/// The L2 client used by the watcher.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait L2Provider: Send + Sync {
    /// Returns the number of the L2 chain tip.
    async fn tip_number(&self) -> Result<u64, ProviderError>;

    /// Returns the block at `number`, or [`None`] if the node does not have it.
    async fn block(&self, number: u64) -> Result<Option<L2Block>, ProviderError>;

    /// Returns the logs of the rollup contracts emitted in blocks `[from, to]`.
    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ProviderError>;
}

/// The L2 contracts observed by the relayer.
#[derive(Debug, Clone, Copy)]
pub struct L2Contracts {
    /// The L2 message queue, which emits `AppendMessage` and holds the withdraw trie root.
    pub message_queue: Address,
    /// The L2 scroll messenger, which emits `SentMessage`.
    pub messenger: Address,
    /// The storage slot of the withdraw trie root in the message queue.
    pub withdraw_trie_root_slot: U256,
}

/// An [`L2Provider`] backed by an alloy [`Provider`] connected to an L2 node.
#[derive(Debug, Clone)]
pub struct AlloyL2Provider<P> {
    provider: P,
    contracts: L2Contracts,
}

impl<P> AlloyL2Provider<P> {
    /// Returns a new [`AlloyL2Provider`] wrapping `provider`.
    pub const fn new(provider: P, contracts: L2Contracts) -> Self {
        Self { provider, contracts }
    }
}

/// The block returned by `scroll_getBlockByNumber`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlock {
    number: U64,
    hash: B256,
    parent_hash: B256,
    state_root: B256,
    timestamp: U64,
    transactions: Vec<serde_json::Value>,
    #[serde(default)]
    row_consumption: Option<Vec<SubCircuitRowUsage>>,
}

/// The rows used by a block in one of the prover sub-circuits.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubCircuitRowUsage {
    row_number: u64,
}

/// Returns the EIP-2718 encoding of the L2 transactions of the block, skipping L1 messages.
fn l2_transactions(transactions: Vec<serde_json::Value>) -> Result<Vec<Bytes>, ProviderError> {
    let mut encoded = Vec::with_capacity(transactions.len());
    for tx in transactions {
        if tx.get("type").and_then(|t| t.as_str()) == Some(L1_MESSAGE_TX_TYPE) {
            continue;
        }
        let tx: Transaction = serde_json::from_value(tx)?;
        encoded.push(tx.inner.inner().encoded_2718().into());
    }
    Ok(encoded)
}

#[async_trait::async_trait]
impl<P: Provider + Send + Sync> L2Provider for AlloyL2Provider<P> {
    async fn tip_number(&self) -> Result<u64, ProviderError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn block(&self, number: u64) -> Result<Option<L2Block>, ProviderError> {
        let block: Option<RpcBlock> = self
            .provider
            .raw_request("scroll_getBlockByNumber".into(), (BlockNumberOrTag::Number(number), true))
            .await?;
        let Some(block) = block else { return Ok(None) };

        let withdraw_root = self
            .provider
            .get_storage_at(self.contracts.message_queue, self.contracts.withdraw_trie_root_slot)
            .block_id(BlockId::number(number))
            .await?;

        // A block is bounded by its most used sub-circuit.
        let row_consumption = block
            .row_consumption
            .unwrap_or_default()
            .iter()
            .map(|usage| usage.row_number)
            .max()
            .unwrap_or_default();
        let tx_num = block.transactions.len() as u64;

        let transactions = l2_transactions(block.transactions)?;

        Ok(Some(
            L2Block {
                number: block.number.to(),
                hash: block.hash,
                parent_hash: block.parent_hash,
                state_root: block.state_root,
                withdraw_root: B256::from(withdraw_root.to_be_bytes::<32>()),
                timestamp: block.timestamp.to(),
                tx_num,
                row_consumption,
                ..Default::default()
            }
            .with_transactions(transactions),
        ))
    }

    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ProviderError> {
        let filter = Filter::new()
            .address(vec![self.contracts.message_queue, self.contracts.messenger])
            .from_block(from)
            .to_block(to);
        Ok(self.provider.get_logs(&filter).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_transactions_skip_l1_messages() -> eyre::Result<()> {
        let l1_message = serde_json::json!({
            "type": "0x7e",
            "hash": "0x0000000000000000000000000000000000000000000000000000000000000001",
        });
        assert!(l2_transactions(vec![l1_message])?.is_empty());

        let block: RpcBlock = serde_json::from_value(serde_json::json!({
            "number": "0x10",
            "hash": "0x0000000000000000000000000000000000000000000000000000000000000002",
            "parentHash": "0x0000000000000000000000000000000000000000000000000000000000000001",
            "stateRoot": "0x0000000000000000000000000000000000000000000000000000000000000003",
            "timestamp": "0x64",
            "transactions": [],
            "rowConsumption": [
                { "name": "evm", "rowNumber": 10 },
                { "name": "keccak", "rowNumber": 25 }
            ]
        }))?;
        assert_eq!(block.number.to::<u64>(), 16);
        assert_eq!(block.row_consumption.unwrap().iter().map(|r| r.row_number).max(), Some(25));

        Ok(())
    }
}
