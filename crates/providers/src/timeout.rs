use crate::{L1Provider, L2Provider, ProviderError, TransactionReceiptInfo};

use alloy_primitives::{Address, B256};
use alloy_rpc_types_eth::Log;
use rollup_relayer_primitives::L2Block;
use std::{future::Future, time::Duration};

/// Wraps a provider and fails every call that does not complete within the configured timeout.
#[derive(Debug, Clone)]
pub struct TimeoutProvider<P> {
    inner: P,
    timeout: Duration,
}

impl<P> TimeoutProvider<P> {
    /// Returns a new [`TimeoutProvider`] wrapping `inner`.
    pub const fn new(inner: P, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.timeout, fut).await.map_err(|_| {
            tracing::debug!(target: "scroll::providers", timeout = ?self.timeout, "rpc call timed out");
            ProviderError::Timeout(self.timeout)
        })?
    }
}

#[async_trait::async_trait]
impl<P: L2Provider> L2Provider for TimeoutProvider<P> {
    async fn tip_number(&self) -> Result<u64, ProviderError> {
        self.call(self.inner.tip_number()).await
    }

    async fn block(&self, number: u64) -> Result<Option<L2Block>, ProviderError> {
        self.call(self.inner.block(number)).await
    }

    async fn logs(&self, from: u64, to: u64) -> Result<Vec<Log>, ProviderError> {
        self.call(self.inner.logs(from, to)).await
    }
}

#[async_trait::async_trait]
impl<P: L1Provider> L1Provider for TimeoutProvider<P> {
    async fn block_number(&self) -> Result<u64, ProviderError> {
        self.call(self.inner.block_number()).await
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, ProviderError> {
        self.call(self.inner.transaction_count(address)).await
    }

    async fn gas_price(&self) -> Result<u128, ProviderError> {
        self.call(self.inner.gas_price()).await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, ProviderError> {
        self.call(self.inner.send_raw_transaction(raw)).await
    }

    async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceiptInfo>, ProviderError> {
        self.call(self.inner.transaction_receipt(hash)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockL2Provider;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_slow_calls() {
        let mock = MockL2Provider::default();
        mock.set_tip(10);
        mock.set_delay(Duration::from_secs(5));
        let provider = TimeoutProvider::new(&mock, Duration::from_secs(1));

        assert!(matches!(provider.tip_number().await, Err(ProviderError::Timeout(_))));

        mock.set_delay(Duration::ZERO);
        assert_eq!(provider.tip_number().await.unwrap(), 10);
    }
}
