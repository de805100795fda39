use alloy_primitives::{Bytes, B256};
use rollup_relayer_primitives::{Batch, BatchCost};
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a batch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "batch")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub index: i64,
    pub hash: Vec<u8>,
    pub parent_hash: Vec<u8>,
    pub data_hash: Vec<u8>,
    pub start_chunk_index: i64,
    pub end_chunk_index: i64,
    pub start_block_number: i64,
    pub end_block_number: i64,
    pub prev_state_root: Vec<u8>,
    pub post_state_root: Vec<u8>,
    pub withdraw_root: Vec<u8>,
    pub calldata_size: i64,
    pub proof_cost: i64,
    pub commit_gas: i64,
    pub status: String,
    pub proof: Option<Vec<u8>>,
    pub created_at: i64,
    pub committed_at: Option<i64>,
    pub finalized_at: Option<i64>,
}

/// The relation for the batch model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the batch model.
impl ActiveModelBehavior for ActiveModel {}

impl From<Batch> for ActiveModel {
    fn from(batch: Batch) -> Self {
        Self {
            index: ActiveValue::Set(batch.index.try_into().expect("index should fit in i64")),
            hash: ActiveValue::Set(batch.hash.to_vec()),
            parent_hash: ActiveValue::Set(batch.parent_hash.to_vec()),
            data_hash: ActiveValue::Set(batch.data_hash.to_vec()),
            start_chunk_index: ActiveValue::Set(
                batch.start_chunk_index.try_into().expect("index should fit in i64"),
            ),
            end_chunk_index: ActiveValue::Set(
                batch.end_chunk_index.try_into().expect("index should fit in i64"),
            ),
            start_block_number: ActiveValue::Set(
                batch.start_block_number.try_into().expect("block number should fit in i64"),
            ),
            end_block_number: ActiveValue::Set(
                batch.end_block_number.try_into().expect("block number should fit in i64"),
            ),
            prev_state_root: ActiveValue::Set(batch.prev_state_root.to_vec()),
            post_state_root: ActiveValue::Set(batch.post_state_root.to_vec()),
            withdraw_root: ActiveValue::Set(batch.withdraw_root.to_vec()),
            calldata_size: ActiveValue::Set(batch.cost.calldata_size as i64),
            proof_cost: ActiveValue::Set(batch.cost.proof_cost as i64),
            commit_gas: ActiveValue::Set(batch.cost.commit_gas as i64),
            status: ActiveValue::Set(batch.status.as_str().to_owned()),
            proof: ActiveValue::Set(batch.proof.map(|p| p.to_vec())),
            created_at: ActiveValue::Set(batch.created_at as i64),
            committed_at: ActiveValue::Set(batch.committed_at.map(|t| t as i64)),
            finalized_at: ActiveValue::Set(batch.finalized_at.map(|t| t as i64)),
        }
    }
}

impl From<Model> for Batch {
    fn from(value: Model) -> Self {
        Self {
            index: value.index as u64,
            hash: B256::from_slice(&value.hash),
            parent_hash: B256::from_slice(&value.parent_hash),
            data_hash: B256::from_slice(&value.data_hash),
            start_chunk_index: value.start_chunk_index as u64,
            end_chunk_index: value.end_chunk_index as u64,
            start_block_number: value.start_block_number as u64,
            end_block_number: value.end_block_number as u64,
            prev_state_root: B256::from_slice(&value.prev_state_root),
            post_state_root: B256::from_slice(&value.post_state_root),
            withdraw_root: B256::from_slice(&value.withdraw_root),
            cost: BatchCost {
                calldata_size: value.calldata_size as u64,
                proof_cost: value.proof_cost as u64,
                commit_gas: value.commit_gas as u64,
            },
            status: value.status.parse().expect("invalid batch status"),
            proof: value.proof.map(Bytes::from),
            created_at: value.created_at as u64,
            committed_at: value.committed_at.map(|t| t as u64),
            finalized_at: value.finalized_at.map(|t| t as u64),
        }
    }
}
