use alloy_primitives::{Bytes, B256};

/// The size of the length prefix of each transaction in a committed payload.
pub const TX_LENGTH_PREFIX_SIZE: u64 = 4;

/// A confirmed L2 block, as recorded by the watcher.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct L2Block {
    /// The block number.
    pub number: u64,
    /// The block hash.
    pub hash: B256,
    /// The hash of the parent block.
    pub parent_hash: B256,
    /// The state root after executing the block.
    pub state_root: B256,
    /// The withdraw trie root of the message queue at this block.
    pub withdraw_root: B256,
    /// The block timestamp.
    pub timestamp: u64,
    /// The number of transactions in the block, L1 messages included.
    pub tx_num: u64,
    /// The EIP-2718 encoded L2 transactions of the block, L1 messages excluded.
    pub transactions: Vec<Bytes>,
    /// The committed size of the L2 transactions in bytes, each with its length prefix.
    pub payload_size: u64,
    /// The number of prover circuit rows consumed by the block.
    pub row_consumption: u64,
}

impl L2Block {
    /// Returns true if `self` directly extends `parent`.
    pub fn is_child_of(&self, parent: &Self) -> bool {
        self.number == parent.number + 1 && self.parent_hash == parent.hash
    }

    /// Sets the L2 transactions of the block along with their committed size.
    pub fn with_transactions(mut self, transactions: Vec<Bytes>) -> Self {
        self.payload_size =
            transactions.iter().map(|tx| TX_LENGTH_PREFIX_SIZE + tx.len() as u64).sum();
        self.transactions = transactions;
        self
    }

    /// Returns the number of L1 messages included in the block.
    pub fn l1_message_num(&self) -> u64 {
        self.tx_num.saturating_sub(self.transactions.len() as u64)
    }

    /// Appends the committed payload of the block to `out`: every L2 transaction preceded by its
    /// big endian `u32` length.
    pub fn encode_payload(&self, out: &mut Vec<u8>) {
        for tx in &self.transactions {
            out.extend_from_slice(&(tx.len() as u32).to_be_bytes());
            out.extend_from_slice(tx);
        }
    }

    /// Decodes `count` length prefixed transactions from the front of `buf`, advancing it.
    /// Returns [`None`] if `buf` is too short.
    pub fn decode_payload(buf: &mut &[u8], count: usize) -> Option<Vec<Bytes>> {
        let mut transactions = Vec::with_capacity(count);
        for _ in 0..count {
            let (len, rest) = buf.split_first_chunk::<4>()?;
            let len = u32::from_be_bytes(*len) as usize;
            if rest.len() < len {
                return None
            }
            let (tx, rest) = rest.split_at(len);
            transactions.push(Bytes::copy_from_slice(tx));
            *buf = rest;
        }
        Some(transactions)
    }
}

#[cfg(feature = "arbitrary")]
impl arbitrary::Arbitrary<'_> for L2Block {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        Ok(Self {
            number: u.int_in_range(0..=u32::MAX)? as u64,
            hash: B256::arbitrary(u)?,
            parent_hash: B256::arbitrary(u)?,
            state_root: B256::arbitrary(u)?,
            withdraw_root: B256::arbitrary(u)?,
            timestamp: u.int_in_range(0..=u32::MAX)? as u64,
            tx_num: u.int_in_range(0..=1_000)?,
            transactions: Vec::new(),
            payload_size: u.int_in_range(0..=100_000)?,
            row_consumption: u.int_in_range(0..=1_000_000)?,
        })
    }
}
