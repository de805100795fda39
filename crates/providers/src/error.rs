use alloy_json_rpc::RpcError;
use alloy_transport::TransportErrorKind;
use std::time::Duration;

/// An error occurring at one of the providers.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// RPC error.
    #[error(transparent)]
    Rpc(#[from] RpcError<TransportErrorKind>),
    /// The call did not complete in time.
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
    /// The response could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The classification of a rejected transaction broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendErrorKind {
    /// The node already has the transaction.
    AlreadyKnown,
    /// The nonce was already used, usually by a previous attempt that got included.
    NonceTooLow,
    /// The fee is too low to enter or replace in the mempool.
    Underpriced,
    /// The sender cannot pay for the transaction.
    InsufficientFunds,
    /// Any other failure.
    Other,
}

impl ProviderError {
    /// Classifies the error returned by a transaction broadcast.
    pub fn send_error_kind(&self) -> SendErrorKind {
        let Self::Rpc(RpcError::ErrorResp(payload)) = self else {
            return SendErrorKind::Other;
        };
        let message = payload.message.to_lowercase();

        if message.contains("already known") || message.contains("known transaction") {
            SendErrorKind::AlreadyKnown
        } else if message.contains("nonce too low") {
            SendErrorKind::NonceTooLow
        } else if message.contains("underpriced") {
            SendErrorKind::Underpriced
        } else if message.contains("insufficient funds") {
            SendErrorKind::InsufficientFunds
        } else {
            SendErrorKind::Other
        }
    }
}
