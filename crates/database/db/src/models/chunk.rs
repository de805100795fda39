use alloy_primitives::B256;
use rollup_relayer_primitives::Chunk;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a chunk.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "chunk")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub index: i64,
    pub hash: Vec<u8>,
    pub start_block_number: i64,
    pub start_block_hash: Vec<u8>,
    pub start_block_timestamp: i64,
    pub end_block_number: i64,
    pub end_block_hash: Vec<u8>,
    pub prev_state_root: Vec<u8>,
    pub post_state_root: Vec<u8>,
    pub withdraw_root: Vec<u8>,
    pub tx_num: i64,
    pub payload_size: i64,
    pub row_consumption: i64,
    pub created_at: i64,
    pub batch_index: Option<i64>,
}

/// The relation for the chunk model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the chunk model.
impl ActiveModelBehavior for ActiveModel {}

impl From<Chunk> for ActiveModel {
    fn from(chunk: Chunk) -> Self {
        Self {
            index: ActiveValue::Set(chunk.index.try_into().expect("index should fit in i64")),
            hash: ActiveValue::Set(chunk.hash.to_vec()),
            start_block_number: ActiveValue::Set(
                chunk.start_block_number.try_into().expect("block number should fit in i64"),
            ),
            start_block_hash: ActiveValue::Set(chunk.start_block_hash.to_vec()),
            start_block_timestamp: ActiveValue::Set(chunk.start_block_timestamp as i64),
            end_block_number: ActiveValue::Set(
                chunk.end_block_number.try_into().expect("block number should fit in i64"),
            ),
            end_block_hash: ActiveValue::Set(chunk.end_block_hash.to_vec()),
            prev_state_root: ActiveValue::Set(chunk.prev_state_root.to_vec()),
            post_state_root: ActiveValue::Set(chunk.post_state_root.to_vec()),
            withdraw_root: ActiveValue::Set(chunk.withdraw_root.to_vec()),
            tx_num: ActiveValue::Set(chunk.tx_num as i64),
            payload_size: ActiveValue::Set(chunk.payload_size as i64),
            row_consumption: ActiveValue::Set(chunk.row_consumption as i64),
            created_at: ActiveValue::Set(chunk.created_at as i64),
            batch_index: ActiveValue::Set(chunk.batch_index.map(|i| i as i64)),
        }
    }
}

impl From<Model> for Chunk {
    fn from(value: Model) -> Self {
        Self {
            index: value.index as u64,
            hash: B256::from_slice(&value.hash),
            start_block_number: value.start_block_number as u64,
            start_block_hash: B256::from_slice(&value.start_block_hash),
            start_block_timestamp: value.start_block_timestamp as u64,
            end_block_number: value.end_block_number as u64,
            end_block_hash: B256::from_slice(&value.end_block_hash),
            prev_state_root: B256::from_slice(&value.prev_state_root),
            post_state_root: B256::from_slice(&value.post_state_root),
            withdraw_root: B256::from_slice(&value.withdraw_root),
            tx_num: value.tx_num as u64,
            payload_size: value.payload_size as u64,
            row_consumption: value.row_consumption as u64,
            created_at: value.created_at as u64,
            batch_index: value.batch_index.map(|i| i as u64),
        }
    }
}
