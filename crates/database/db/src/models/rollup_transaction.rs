use alloy_primitives::Address;
use rollup_relayer_primitives::{RollupTransaction, RollupTxKind, TransactionAttempt};
use sea_orm::{entity::prelude::*, ActiveValue};

/// A database model that represents an L1 transaction sent for a batch.
///
/// There is at most one transaction of each kind per batch.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "rollup_transaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub batch_index: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: String,
    pub sender: Vec<u8>,
    pub nonce: i64,
    pub status: String,
}

impl Model {
    /// Converts the model into a [`RollupTransaction`] with the given attempts.
    pub(crate) fn into_transaction(self, attempts: Vec<TransactionAttempt>) -> RollupTransaction {
        RollupTransaction {
            batch_index: self.batch_index as u64,
            kind: self.kind.parse().expect("invalid transaction kind"),
            sender: Address::from_slice(&self.sender),
            nonce: self.nonce as u64,
            status: self.status.parse().expect("invalid transaction status"),
            attempts,
        }
    }
}

/// The relation for the rollup transaction model.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// The active model behavior for the rollup transaction model.
impl ActiveModelBehavior for ActiveModel {}

impl From<&RollupTransaction> for ActiveModel {
    fn from(tx: &RollupTransaction) -> Self {
        Self {
            batch_index: ActiveValue::Set(
                tx.batch_index.try_into().expect("index should fit in i64"),
            ),
            kind: ActiveValue::Set(tx.kind.as_str().to_owned()),
            sender: ActiveValue::Set(tx.sender.to_vec()),
            nonce: ActiveValue::Set(tx.nonce.try_into().expect("nonce should fit in i64")),
            status: ActiveValue::Set(tx.status.as_str().to_owned()),
        }
    }
}

/// Returns the primary key of the transaction of `kind` for the batch at `batch_index`.
pub(crate) fn primary_key(batch_index: u64, kind: RollupTxKind) -> (i64, String) {
    (batch_index as i64, kind.as_str().to_owned())
}
