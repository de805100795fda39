//! Calldata of the rollup contract calls.

use crate::RelayerError;

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use rollup_relayer_primitives::{Batch, L2Block};

/// The codec version of the committed batches.
pub const CODEC_VERSION: u8 = 0;

/// The size of the encoded context of a block in a chunk.
pub const BLOCK_CONTEXT_SIZE: usize = 60;

/// The size of an encoded batch header.
pub const BATCH_HEADER_SIZE: usize = 1 + 8 + 32 + 32;

sol! {
    #[derive(Debug)]
    function commitBatch(
        uint8 version,
        bytes calldata parentBatchHeader,
        bytes[] memory chunks,
        bytes calldata skippedL1MessageBitmap
    ) external;

    #[derive(Debug)]
    function finalizeBatchWithProof(
        bytes calldata batchHeader,
        bytes32 prevStateRoot,
        bytes32 postStateRoot,
        bytes32 withdrawRoot,
        bytes calldata aggrProof
    ) external;
}

/// Encodes the header of `batch`: the codec version, the batch index, the data hash and the
/// parent batch hash.
pub fn encode_batch_header(batch: &Batch) -> Bytes {
    let mut header = Vec::with_capacity(BATCH_HEADER_SIZE);
    header.push(CODEC_VERSION);
    header.extend_from_slice(&batch.index.to_be_bytes());
    header.extend_from_slice(batch.data_hash.as_slice());
    header.extend_from_slice(batch.parent_hash.as_slice());
    header.into()
}

/// Encodes chunk `chunk_index` as its number of blocks, followed by the 60 byte context of each
/// block, followed by the length prefixed L2 transactions of each block.
pub fn encode_chunk(chunk_index: u64, blocks: &[L2Block]) -> Result<Bytes, RelayerError> {
    let overflow = |field| RelayerError::ChunkOverflow { chunk_index, field };

    let payload_size = blocks.iter().map(|block| block.payload_size as usize).sum::<usize>();
    let mut chunk = Vec::with_capacity(1 + BLOCK_CONTEXT_SIZE * blocks.len() + payload_size);
    chunk.push(u8::try_from(blocks.len()).map_err(|_| overflow("block count"))?);
    for block in blocks {
        let tx_num = u16::try_from(block.tx_num).map_err(|_| overflow("transaction count"))?;
        let l1_message_num =
            u16::try_from(block.l1_message_num()).map_err(|_| overflow("l1 message count"))?;
        chunk.extend_from_slice(&block.number.to_be_bytes());
        chunk.extend_from_slice(&block.timestamp.to_be_bytes());
        // base fee
        chunk.extend_from_slice(&U256::ZERO.to_be_bytes::<32>());
        // gas limit
        chunk.extend_from_slice(&0u64.to_be_bytes());
        chunk.extend_from_slice(&tx_num.to_be_bytes());
        chunk.extend_from_slice(&l1_message_num.to_be_bytes());
    }
    for block in blocks {
        block.encode_payload(&mut chunk);
    }
    Ok(chunk.into())
}

/// Returns the calldata committing the batch following `parent_header` with the encoded
/// `chunks`.
pub fn commit_batch_calldata(parent_header: Bytes, chunks: Vec<Bytes>) -> Bytes {
    commitBatchCall {
        version: CODEC_VERSION,
        parentBatchHeader: parent_header,
        chunks,
        skippedL1MessageBitmap: Bytes::new(),
    }
    .abi_encode()
    .into()
}

/// Returns the calldata finalizing `batch` with its validity `proof`.
pub fn finalize_batch_calldata(batch: &Batch, proof: Bytes) -> Bytes {
    finalizeBatchWithProofCall {
        batchHeader: encode_batch_header(batch),
        prevStateRoot: batch.prev_state_root,
        postStateRoot: batch.post_state_root,
        withdrawRoot: batch.withdraw_root,
        aggrProof: proof,
    }
    .abi_encode()
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use rollup_relayer_primitives::{BatchStatus, Chunk};

    /// A decoded block context of a chunk.
    #[derive(Debug, PartialEq, Eq)]
    struct BlockContext {
        number: u64,
        timestamp: u64,
        num_transactions: u16,
        num_l1_messages: u16,
    }

    fn decode_chunk(mut buf: &[u8]) -> Option<(Vec<BlockContext>, Vec<Vec<Bytes>>)> {
        let (&count, rest) = buf.split_first()?;
        buf = rest;

        let mut contexts = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let (context, rest) = buf.split_first_chunk::<BLOCK_CONTEXT_SIZE>()?;
            buf = rest;
            let u64_at = |at: usize| u64::from_be_bytes(context[at..at + 8].try_into().unwrap());
            let u16_at = |at: usize| u16::from_be_bytes(context[at..at + 2].try_into().unwrap());
            contexts.push(BlockContext {
                number: u64_at(0),
                timestamp: u64_at(8),
                num_transactions: u16_at(56),
                num_l1_messages: u16_at(58),
            });
        }

        let mut transactions = Vec::with_capacity(contexts.len());
        for context in &contexts {
            let count = (context.num_transactions - context.num_l1_messages) as usize;
            transactions.push(L2Block::decode_payload(&mut buf, count)?);
        }
        buf.is_empty().then_some((contexts, transactions))
    }

    #[test]
    fn test_encode_chunk() {
        let blocks = [
            L2Block { number: 1, timestamp: 10, tx_num: 3, ..Default::default() },
            L2Block { number: 2, timestamp: 11, tx_num: 0, ..Default::default() },
        ];

        let chunk = encode_chunk(1, &blocks).unwrap();

        assert_eq!(chunk.len(), 1 + 60 * 2);
        assert_eq!(chunk[0], 2);
        assert_eq!(&chunk[1..9], &1u64.to_be_bytes());
        assert_eq!(&chunk[57..59], &3u16.to_be_bytes());
        assert_eq!(&chunk[59..61], &3u16.to_be_bytes());
    }

    #[test]
    fn test_encode_chunk_with_transactions() {
        // Given a block mixing L1 messages with L2 transactions, and an empty block
        let first = L2Block { number: 8, timestamp: 80, tx_num: 3, ..Default::default() }
            .with_transactions(vec![
                Bytes::from_static(&[0x02, 0xf8, 0x6f, 0x01]),
                Bytes::from(vec![0xf8; 300]),
            ]);
        let second = L2Block { number: 9, timestamp: 81, tx_num: 1, ..Default::default() }
            .with_transactions(vec![Bytes::from_static(&[0x01, 0xc0])]);
        let empty = L2Block { number: 10, timestamp: 82, ..Default::default() };
        let blocks = [first, second, empty];

        // When
        let encoded = encode_chunk(4, &blocks).unwrap();

        // Then the encoded size is the one accounted for by the proposers
        let chunk = Chunk::from_blocks(4, B256::ZERO, &blocks, 0).unwrap();
        assert_eq!(
            encoded.len() as u64,
            1 + BLOCK_CONTEXT_SIZE as u64 * chunk.num_blocks() + chunk.payload_size
        );

        let (contexts, transactions) = decode_chunk(&encoded).expect("valid chunk");
        assert_eq!(
            contexts,
            vec![
                BlockContext { number: 8, timestamp: 80, num_transactions: 3, num_l1_messages: 1 },
                BlockContext { number: 9, timestamp: 81, num_transactions: 1, num_l1_messages: 0 },
                BlockContext { number: 10, timestamp: 82, num_transactions: 0, num_l1_messages: 0 },
            ]
        );
        assert_eq!(
            transactions,
            blocks.iter().map(|block| block.transactions.clone()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_encode_chunk_rejects_overflow() {
        let blocks = (0..256).map(|number| L2Block { number, ..Default::default() });
        let err = encode_chunk(3, &blocks.collect::<Vec<_>>()).unwrap_err();
        assert!(matches!(err, RelayerError::ChunkOverflow { chunk_index: 3, field: "block count" }));
        assert!(err.is_fatal());

        let block = L2Block { tx_num: u16::MAX as u64 + 1, ..Default::default() };
        let err = encode_chunk(3, &[block]).unwrap_err();
        assert!(matches!(err, RelayerError::ChunkOverflow { field: "transaction count", .. }));
    }

    #[test]
    fn test_finalize_calldata_roundtrip() {
        let batch = Batch {
            index: 7,
            hash: B256::repeat_byte(1),
            parent_hash: B256::repeat_byte(2),
            data_hash: B256::repeat_byte(3),
            start_chunk_index: 0,
            end_chunk_index: 0,
            start_block_number: 0,
            end_block_number: 0,
            prev_state_root: B256::repeat_byte(4),
            post_state_root: B256::repeat_byte(5),
            withdraw_root: B256::repeat_byte(6),
            cost: Default::default(),
            status: BatchStatus::Committed,
            proof: None,
            created_at: 0,
            committed_at: None,
            finalized_at: None,
        };

        let calldata = finalize_batch_calldata(&batch, Bytes::from_static(&[0xaa; 4]));
        let call = finalizeBatchWithProofCall::abi_decode(&calldata).unwrap();

        assert_eq!(call.batchHeader.len(), BATCH_HEADER_SIZE);
        assert_eq!(call.batchHeader[0], CODEC_VERSION);
        assert_eq!(&call.batchHeader[1..9], &7u64.to_be_bytes());
        assert_eq!(call.prevStateRoot, batch.prev_state_root);
        assert_eq!(call.postStateRoot, batch.post_state_root);
        assert_eq!(call.aggrProof.len(), 4);
    }
}
