use crate::L2Block;
use alloy_primitives::{keccak256, B256};

/// A contiguous range of L2 blocks proven together.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// The chunk index.
    pub index: u64,
    /// The chunk hash.
    pub hash: B256,
    /// The first block of the chunk.
    pub start_block_number: u64,
    /// The hash of the first block of the chunk.
    pub start_block_hash: B256,
    /// The timestamp of the first block of the chunk.
    pub start_block_timestamp: u64,
    /// The last block of the chunk.
    pub end_block_number: u64,
    /// The hash of the last block of the chunk.
    pub end_block_hash: B256,
    /// The state root before the first block.
    pub prev_state_root: B256,
    /// The state root after the last block.
    pub post_state_root: B256,
    /// The withdraw root after the last block.
    pub withdraw_root: B256,
    /// The total number of transactions.
    pub tx_num: u64,
    /// The total transaction payload size in bytes.
    pub payload_size: u64,
    /// The total row consumption.
    pub row_consumption: u64,
    /// The unix timestamp the chunk was proposed at.
    pub created_at: u64,
    /// The batch the chunk was assigned to, if any.
    pub batch_index: Option<u64>,
}

impl Chunk {
    /// Builds the chunk at `index` covering `blocks`. Returns [`None`] if `blocks` is empty.
    ///
    /// The caller is responsible for the blocks being contiguous.
    pub fn from_blocks(
        index: u64,
        prev_state_root: B256,
        blocks: &[L2Block],
        created_at: u64,
    ) -> Option<Self> {
        let (first, last) = (blocks.first()?, blocks.last()?);

        let mut preimage = Vec::with_capacity(32 * (blocks.len() + 3));
        for block in blocks {
            preimage.extend_from_slice(block.hash.as_slice());
        }
        preimage.extend_from_slice(prev_state_root.as_slice());
        preimage.extend_from_slice(last.state_root.as_slice());
        preimage.extend_from_slice(last.withdraw_root.as_slice());

        Some(Self {
            index,
            hash: keccak256(&preimage),
            start_block_number: first.number,
            start_block_hash: first.hash,
            start_block_timestamp: first.timestamp,
            end_block_number: last.number,
            end_block_hash: last.hash,
            prev_state_root,
            post_state_root: last.state_root,
            withdraw_root: last.withdraw_root,
            tx_num: blocks.iter().map(|b| b.tx_num).sum(),
            payload_size: blocks.iter().map(|b| b.payload_size).sum(),
            row_consumption: blocks.iter().map(|b| b.row_consumption).sum(),
            created_at,
            batch_index: None,
        })
    }

    /// Returns the number of blocks in the chunk.
    pub const fn num_blocks(&self) -> u64 {
        self.end_block_number - self.start_block_number + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(number: u64, rows: u64) -> L2Block {
        L2Block {
            number,
            hash: B256::with_last_byte(number as u8),
            parent_hash: B256::with_last_byte(number.saturating_sub(1) as u8),
            state_root: B256::repeat_byte(number as u8),
            timestamp: 100 + number,
            tx_num: 2,
            payload_size: 10,
            row_consumption: rows,
            ..Default::default()
        }
    }

    #[test]
    fn test_chunk_from_blocks() {
        let blocks = [block(5, 1), block(6, 2), block(7, 3)];
        let chunk = Chunk::from_blocks(3, B256::ZERO, &blocks, 1_000).unwrap();

        assert_eq!(chunk.index, 3);
        assert_eq!(chunk.start_block_number, 5);
        assert_eq!(chunk.end_block_number, 7);
        assert_eq!(chunk.start_block_timestamp, 105);
        assert_eq!(chunk.num_blocks(), 3);
        assert_eq!(chunk.tx_num, 6);
        assert_eq!(chunk.payload_size, 30);
        assert_eq!(chunk.row_consumption, 6);
        assert_eq!(chunk.post_state_root, B256::repeat_byte(7));
        assert_eq!(chunk.batch_index, None);
    }

    #[test]
    fn test_chunk_hash_depends_on_blocks() {
        let a = Chunk::from_blocks(0, B256::ZERO, &[block(1, 1)], 0).unwrap();
        let b = Chunk::from_blocks(0, B256::ZERO, &[block(1, 1), block(2, 1)], 0).unwrap();
        assert_ne!(a.hash, b.hash);
        assert!(Chunk::from_blocks(0, B256::ZERO, &[], 0).is_none());
    }
}
