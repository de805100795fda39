use alloy_primitives::B256;
use rollup_relayer_primitives::L2Message;
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents an L2 to L1 message.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "l2_message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub queue_index: i64,
    pub message_hash: Vec<u8>,
    pub block_number: i64,
    pub tx_hash: Vec<u8>,
}

/// The relation for the L2 message model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the L2 message model.
impl ActiveModelBehavior for ActiveModel {}

impl From<L2Message> for ActiveModel {
    fn from(message: L2Message) -> Self {
        Self {
            queue_index: ActiveValue::Set(
                message.queue_index.try_into().expect("queue index should fit in i64"),
            ),
            message_hash: ActiveValue::Set(message.message_hash.to_vec()),
            block_number: ActiveValue::Set(
                message.block_number.try_into().expect("block number should fit in i64"),
            ),
            tx_hash: ActiveValue::Set(message.tx_hash.to_vec()),
        }
    }
}

impl From<Model> for L2Message {
    fn from(value: Model) -> Self {
        Self {
            queue_index: value.queue_index as u64,
            message_hash: B256::from_slice(&value.message_hash),
            block_number: value.block_number as u64,
            tx_hash: B256::from_slice(&value.tx_hash),
        }
    }
}
