//! Mock providers for tests.

use crate::{L1Provider, L2Provider, ProviderError, TransactionReceiptInfo};

use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_rpc_types_eth::Log;
use alloy_transport::TransportErrorKind;
use parking_lot::Mutex;
use rollup_relayer_primitives::L2Block;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    time::Duration,
};

/// An in-memory [`L2Provider`].
#[derive(Debug, Default)]
pub struct MockL2Provider {
    tip: Mutex<u64>,
    blocks: Mutex<BTreeMap<u64, L2Block>>,
    logs: Mutex<Vec<Log>>,
    failing: Mutex<BTreeSet<u64>>,
    delay: Mutex<Duration>,
}

impl MockL2Provider {
    /// Sets the chain tip.
    pub fn set_tip(&self, tip: u64) {
        *self.tip.lock() = tip;
    }

    /// Adds the blocks to the chain and moves the tip to the highest block.
    pub fn extend(&self, blocks: impl IntoIterator<Item = L2Block>) {
        let mut stored = self.blocks.lock();
        for block in blocks {
            stored.insert(block.number, block);
        }
        if let Some(highest) = stored.keys().next_back() {
            *self.tip.lock() = *highest;
        }
    }

    /// Removes the block at `number`, as if the node had not synced it yet.
    pub fn remove_block(&self, number: u64) {
        self.blocks.lock().remove(&number);
    }

    /// Adds a log to the chain.
    pub fn push_log(&self, log: Log) {
        self.logs.lock().push(log);
    }

    /// Makes fetching the block at `number` fail.
    pub fn fail_block(&self, number: u64) {
        self.failing.lock().insert(number);
    }

    /// Delays every call by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    async fn wait(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl L2Provider for MockL2Provider {
    async fn tip_number(&self) -> Result<u64, ProviderError> {
        self.wait().await;
        Ok(*self.tip.lock())
    }

    async fn block(&self, number: u64) -> Result<Option<L2Block>, ProviderError> {
        self.wait().await;
        if self.failing.lock().contains(&number) {
            return Err(TransportErrorKind::custom_str("block unavailable").into());
        }
        Ok(self.blocks.lock().get(&number).cloned())
    }

    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ProviderError> {
        self.wait().await;
        Ok(self
            .logs
            .lock()
            .iter()
            .filter(|log| log.block_number.is_some_and(|n| n >= from && n <= to))
            .cloned()
            .collect())
    }
}

/// An in-memory [`L1Provider`] that records broadcast transactions and lets the test decide when
/// they are included.
#[derive(Debug, Default)]
pub struct MockL1Provider {
    head: Mutex<u64>,
    gas_price: Mutex<u128>,
    nonces: Mutex<HashMap<Address, u64>>,
    sent: Mutex<Vec<Bytes>>,
    receipts: Mutex<HashMap<B256, TransactionReceiptInfo>>,
    rejecting: Mutex<bool>,
}

impl MockL1Provider {
    /// Sets the L1 head.
    pub fn set_head(&self, head: u64) {
        *self.head.lock() = head;
    }

    /// Sets the gas price.
    pub fn set_gas_price(&self, gas_price: u128) {
        *self.gas_price.lock() = gas_price;
    }

    /// Sets the pending nonce of `address`.
    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.nonces.lock().insert(address, nonce);
    }

    /// Makes every broadcast fail.
    pub fn reject_transactions(&self, reject: bool) {
        *self.rejecting.lock() = reject;
    }

    /// Returns every broadcast transaction, in order.
    pub fn sent_transactions(&self) -> Vec<Bytes> {
        self.sent.lock().clone()
    }

    /// Includes the transaction with `hash` at `block_number`.
    pub fn include(&self, hash: B256, block_number: u64, success: bool) {
        self.receipts
            .lock()
            .insert(hash, TransactionReceiptInfo { transaction_hash: hash, block_number, success });
    }
}

#[async_trait::async_trait]
impl L1Provider for MockL1Provider {
    async fn block_number(&self) -> Result<u64, ProviderError> {
        Ok(*self.head.lock())
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ProviderError> {
        Ok(self.nonces.lock().get(&address).copied().unwrap_or_default())
    }

    async fn gas_price(&self) -> Result<u128, ProviderError> {
        Ok(*self.gas_price.lock())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ProviderError> {
        if *self.rejecting.lock() {
            return Err(TransportErrorKind::custom_str("connection refused").into());
        }
        self.sent.lock().push(Bytes::copy_from_slice(raw));
        Ok(keccak256(raw))
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceiptInfo>, ProviderError> {
        Ok(self.receipts.lock().get(&hash).copied())
    }
}
