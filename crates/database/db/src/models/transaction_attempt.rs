use alloy_primitives::{Bytes, B256};
use rollup_relayer_primitives::{GasParams, RollupTxKind, TransactionAttempt};
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents a single broadcast of a rollup transaction.
///
/// Fee values are stored as decimal strings as they do not fit in an `i64`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transaction_attempt")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub batch_index: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub attempt: i64,
    pub hash: Vec<u8>,
    pub gas_limit: i64,
    pub max_fee_per_gas: String,
    pub max_priority_fee_per_gas: String,
    pub raw: Vec<u8>,
    pub submitted_at: i64,
}

/// The relation for the transaction attempt model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the transaction attempt model.
impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    /// Returns the active model for the `attempt`-th broadcast of the transaction of `kind` for
    /// the batch at `batch_index`.
    pub(crate) fn from_attempt(
        batch_index: u64,
        kind: RollupTxKind,
        attempt: u64,
        value: &TransactionAttempt,
    ) -> Self {
        Self {
            batch_index: ActiveValue::Set(batch_index.try_into().expect("index should fit in i64")),
            kind: ActiveValue::Set(kind.as_str().to_owned()),
            attempt: ActiveValue::Set(attempt as i64),
            hash: ActiveValue::Set(value.hash.to_vec()),
            gas_limit: ActiveValue::Set(value.gas.gas_limit as i64),
            max_fee_per_gas: ActiveValue::Set(value.gas.max_fee_per_gas.to_string()),
            max_priority_fee_per_gas: ActiveValue::Set(
                value.gas.max_priority_fee_per_gas.to_string(),
            ),
            raw: ActiveValue::Set(value.raw.to_vec()),
            submitted_at: ActiveValue::Set(value.submitted_at as i64),
        }
    }
}

impl From<Model> for TransactionAttempt {
    fn from(value: Model) -> Self {
        Self {
            hash: B256::from_slice(&value.hash),
            gas: GasParams {
                gas_limit: value.gas_limit as u64,
                max_fee_per_gas: value.max_fee_per_gas.parse().expect("invalid max fee"),
                max_priority_fee_per_gas: value
                    .max_priority_fee_per_gas
                    .parse()
                    .expect("invalid priority fee"),
            },
            raw: Bytes::from(value.raw),
            submitted_at: value.submitted_at as u64,
        }
    }
}
