use alloy_primitives::B256;
use rollup_relayer_primitives::L2Block;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a confirmed L2 block.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "l2_block")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub block_number: i64,
    pub block_hash: Vec<u8>,
    pub parent_hash: Vec<u8>,
    pub state_root: Vec<u8>,
    pub withdraw_root: Vec<u8>,
    pub timestamp: i64,
    pub tx_num: i64,
    pub transactions: Vec<u8>,
    pub payload_size: i64,
    pub row_consumption: i64,
    pub chunk_index: Option<i64>,
}

/// The relation for the L2 block model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the L2 block model.
impl ActiveModelBehavior for ActiveModel {}

impl From<L2Block> for ActiveModel {
    fn from(block: L2Block) -> Self {
        let mut transactions = Vec::with_capacity(block.payload_size as usize);
        block.encode_payload(&mut transactions);
        Self {
            block_number: ActiveValue::Set(
                block.number.try_into().expect("block number should fit in i64"),
            ),
            block_hash: ActiveValue::Set(block.hash.to_vec()),
            parent_hash: ActiveValue::Set(block.parent_hash.to_vec()),
            state_root: ActiveValue::Set(block.state_root.to_vec()),
            withdraw_root: ActiveValue::Set(block.withdraw_root.to_vec()),
            timestamp: ActiveValue::Set(block.timestamp as i64),
            tx_num: ActiveValue::Set(block.tx_num as i64),
            transactions: ActiveValue::Set(transactions),
            payload_size: ActiveValue::Set(block.payload_size as i64),
            row_consumption: ActiveValue::Set(block.row_consumption as i64),
            chunk_index: ActiveValue::NotSet,
        }
    }
}

impl From<Model> for L2Block {
    fn from(value: Model) -> Self {
        let mut buf = value.transactions.as_slice();
        let mut transactions = Vec::new();
        while !buf.is_empty() {
            let tx = L2Block::decode_payload(&mut buf, 1).expect("invalid transaction payload");
            transactions.extend(tx);
        }
        Self {
            number: value.block_number as u64,
            hash: B256::from_slice(&value.block_hash),
            parent_hash: B256::from_slice(&value.parent_hash),
            state_root: B256::from_slice(&value.state_root),
            withdraw_root: B256::from_slice(&value.withdraw_root),
            timestamp: value.timestamp as u64,
            tx_num: value.tx_num as u64,
            transactions,
            payload_size: value.payload_size as u64,
            row_consumption: value.row_consumption as u64,
        }
    }
}
