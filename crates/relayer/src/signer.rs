use crate::error::RelayerResult;

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSigner;
use alloy_primitives::{Address, Bytes, Signature, TxKind, B256, U256};
use rollup_relayer_primitives::GasParams;
use std::{fmt, sync::Arc};

/// A shareable transaction signer.
pub type SharedTxSigner = Arc<dyn TxSigner<Signature> + Send + Sync>;

/// Signs the rollup contract calls of the relayer account.
#[derive(Clone)]
pub struct RollupTxSigner {
    /// The signer of the relayer account.
    signer: SharedTxSigner,
    /// The L1 chain id.
    chain_id: u64,
    /// The rollup contract.
    to: Address,
}

impl fmt::Debug for RollupTxSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RollupTxSigner")
            .field("address", &self.signer.address())
            .field("chain_id", &self.chain_id)
            .field("to", &self.to)
            .finish()
    }
}

impl RollupTxSigner {
    /// Returns a new [`RollupTxSigner`] for calls to `to` on chain `chain_id`.
    pub fn new(signer: SharedTxSigner, chain_id: u64, to: Address) -> Self {
        Self { signer, chain_id, to }
    }

    /// Returns the address of the relayer account.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs a call with `input` at `nonce` and returns its hash along with the EIP-2718 encoded
    /// transaction.
    pub async fn sign(
        &self,
        nonce: u64,
        gas: GasParams,
        input: Bytes,
    ) -> RelayerResult<(B256, Bytes)> {
        self.sign_to(self.to, nonce, gas, input).await
    }

    /// Signs an empty transfer to the relayer account at `nonce`, which only consumes the nonce.
    pub async fn sign_cancellation(
        &self,
        nonce: u64,
        gas: GasParams,
    ) -> RelayerResult<(B256, Bytes)> {
        self.sign_to(self.address(), nonce, gas, Bytes::new()).await
    }

    async fn sign_to(
        &self,
        to: Address,
        nonce: u64,
        gas: GasParams,
        input: Bytes,
    ) -> RelayerResult<(B256, Bytes)> {
        let mut tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            gas_limit: gas.gas_limit,
            max_fee_per_gas: gas.max_fee_per_gas,
            max_priority_fee_per_gas: gas.max_priority_fee_per_gas,
            to: TxKind::Call(to),
            value: U256::ZERO,
            access_list: Default::default(),
            input,
        };
        let signature = self.signer.sign_transaction(&mut tx).await?;
        let signed = tx.into_signed(signature);
        let hash = *signed.hash();
        let raw = TxEnvelope::from(signed).encoded_2718();
        Ok((hash, raw.into()))
    }
}
