use crate::ProviderError;

use alloy_network::ReceiptResponse;
use alloy_primitives::{Address, B256};
use alloy_provider::Provider;

/// The outcome of an included transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionReceiptInfo {
    /// The transaction hash.
    pub transaction_hash: B256,
    /// The block the transaction was included in.
    pub block_number: u64,
    /// Whether the transaction executed successfully.
    pub success: bool,
}

/// The L1 client used by the relayer to send and track its transactions.
#[async_trait::async_trait]
#[auto_impl::auto_impl(&, Arc)]
pub trait L1Provider: Send + Sync {
    /// Returns the latest L1 block number.
    async fn block_number(&self) -> Result<u64, ProviderError>;

    /// Returns the pending transaction count of `address`.
    async fn transaction_count(&self, address: Address) -> Result<u64, ProviderError>;

    /// Returns the current gas price.
    async fn gas_price(&self) -> Result<u128, ProviderError>;

    /// Broadcasts the signed, EIP-2718 encoded transaction and returns its hash.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ProviderError>;

    /// Returns the receipt of the transaction if it was included in a block.
    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceiptInfo>, ProviderError>;
}

/// An [`L1Provider`] backed by an alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct AlloyL1Provider<P> {
    provider: P,
}

impl<P> AlloyL1Provider<P> {
    /// Returns a new [`AlloyL1Provider`] wrapping `provider`.
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait::async_trait]
impl<P: Provider + Send + Sync> L1Provider for AlloyL1Provider<P> {
    async fn block_number(&self) -> Result<u64, ProviderError> {
        Ok(self.provider.get_block_number().await?)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ProviderError> {
        Ok(self.provider.get_transaction_count(address).pending().await?)
    }

    async fn gas_price(&self) -> Result<u128, ProviderError> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ProviderError> {
        let pending = self.provider.send_raw_transaction(raw).await?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceiptInfo>, ProviderError> {
        let receipt = self.provider.get_transaction_receipt(hash).await?;
        Ok(receipt.and_then(|receipt| {
            Some(TransactionReceiptInfo {
                transaction_hash: receipt.transaction_hash(),
                block_number: receipt.block_number()?,
                success: receipt.status(),
            })
        }))
    }
}
