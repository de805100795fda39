use alloy_primitives::B256;

/// An L2 to L1 message appended to the L2 message queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L2Message {
    /// The index of the message in the queue.
    pub queue_index: u64,
    /// The message hash.
    pub message_hash: B256,
    /// The L2 block the message was appended in.
    pub block_number: u64,
    /// The hash of the transaction that appended the message.
    pub tx_hash: B256,
}
