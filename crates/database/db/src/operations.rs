use super::{models, DatabaseError};
use crate::DatabaseConnectionProvider;

use alloy_primitives::{Address, Bytes, B256};
use rollup_relayer_primitives::{
    Batch, BatchCost, BatchStatus, Chunk, L2Block, L2Message, RollupTransaction, RollupTxKind,
    RollupTxStatus, TransactionAttempt,
};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// The metadata key of the highest L2 block recorded by the watcher.
pub const L2_WATERMARK_KEY: &str = "l2_watermark";

/// Returns the metadata key of the next-nonce counter of `address`.
fn nonce_key(address: Address) -> String {
    format!("next_nonce:{address}")
}

/// The statuses of a batch that has not reached a terminal status.
const UNFINISHED_STATUSES: [BatchStatus; 4] = [
    BatchStatus::Unassigned,
    BatchStatus::PendingCommit,
    BatchStatus::Committed,
    BatchStatus::PendingFinalize,
];

/// The [`DatabaseOperations`] trait provides methods for interacting with the database.
#[async_trait::async_trait]
pub trait DatabaseOperations: DatabaseConnectionProvider + Sync {
    // --- metadata ---

    /// Get the metadata value for `key`.
    async fn get_metadata(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(models::metadata::Entity::find_by_id(key.to_owned())
            .one(self.get_connection())
            .await?
            .map(|m| m.value))
    }

    /// Set the metadata value for `key`, overwriting any previous value.
    async fn set_metadata(&self, key: &str, value: String) -> Result<(), DatabaseError> {
        tracing::trace!(target: "scroll::db", key, %value, "Setting metadata in database.");
        let model =
            models::metadata::ActiveModel { key: Set(key.to_owned()), value: Set(value) };
        models::metadata::Entity::insert(model)
            .on_conflict(
                OnConflict::column(models::metadata::Column::Key)
                    .update_column(models::metadata::Column::Value)
                    .to_owned(),
            )
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Get the highest L2 block number recorded by the watcher.
    async fn get_l2_watermark(&self) -> Result<Option<u64>, DatabaseError> {
        self.get_metadata(L2_WATERMARK_KEY)
            .await?
            .map(|value| {
                value.parse().map_err(|_| DatabaseError::InvalidMetadata {
                    key: L2_WATERMARK_KEY.to_owned(),
                    value,
                })
            })
            .transpose()
    }

    /// Set the watermark to `new` if it currently equals `expected`.
    async fn compare_and_set_l2_watermark(
        &self,
        expected: Option<u64>,
        new: u64,
    ) -> Result<(), DatabaseError> {
        let found = self.get_l2_watermark().await?;
        if found != expected {
            return Err(DatabaseError::WatermarkConflict { expected, found });
        }
        tracing::trace!(target: "scroll::db", ?expected, new, "Advancing L2 watermark.");
        self.set_metadata(L2_WATERMARK_KEY, new.to_string()).await
    }

    /// Get the next nonce to allocate for `address`.
    async fn get_next_nonce(&self, address: Address) -> Result<Option<u64>, DatabaseError> {
        let key = nonce_key(address);
        self.get_metadata(&key)
            .await?
            .map(|value| value.parse().map_err(|_| DatabaseError::InvalidMetadata { key, value }))
            .transpose()
    }

    /// Allocate the next nonce for `address` and advance the counter.
    ///
    /// The counter must have been initialized with [`DatabaseOperations::sync_next_nonce`].
    async fn allocate_nonce(&self, address: Address) -> Result<u64, DatabaseError> {
        let nonce = self
            .get_next_nonce(address)
            .await?
            .ok_or(DatabaseError::NonceNotInitialized(address))?;
        self.set_metadata(&nonce_key(address), (nonce + 1).to_string()).await?;
        tracing::trace!(target: "scroll::db", %address, nonce, "Allocated nonce.");
        Ok(nonce)
    }

    /// Set the nonce counter of `address` to the maximum of the persisted counter and the
    /// provided `chain_nonce`, returning the new counter.
    async fn sync_next_nonce(
        &self,
        address: Address,
        chain_nonce: u64,
    ) -> Result<u64, DatabaseError> {
        let persisted = self.get_next_nonce(address).await?;
        let next = persisted.unwrap_or_default().max(chain_nonce);
        tracing::debug!(target: "scroll::db", %address, ?persisted, chain_nonce, next, "Synced nonce counter.");
        self.set_metadata(&nonce_key(address), next.to_string()).await?;
        Ok(next)
    }

    // --- l2 blocks ---

    /// Insert an [`L2Block`], overwriting any block already recorded at the same height. The chunk
    /// assignment of an existing block is preserved.
    async fn upsert_l2_block(&self, block: L2Block) -> Result<(), DatabaseError> {
        use models::l2_block::Column;
        tracing::trace!(target: "scroll::db", number = block.number, hash = ?block.hash, "Upserting L2 block.");
        let model: models::l2_block::ActiveModel = block.into();
        models::l2_block::Entity::insert(model)
            .on_conflict(
                OnConflict::column(Column::BlockNumber)
                    .update_columns([
                        Column::BlockHash,
                        Column::ParentHash,
                        Column::StateRoot,
                        Column::WithdrawRoot,
                        Column::Timestamp,
                        Column::TxNum,
                        Column::Transactions,
                        Column::PayloadSize,
                        Column::RowConsumption,
                    ])
                    .to_owned(),
            )
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Get the [`L2Block`] at `number`.
    async fn get_l2_block(&self, number: u64) -> Result<Option<L2Block>, DatabaseError> {
        Ok(models::l2_block::Entity::find_by_id(number as i64)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get at most `limit` blocks starting at `from`, in ascending order.
    async fn get_l2_blocks(&self, from: u64, limit: u64) -> Result<Vec<L2Block>, DatabaseError> {
        Ok(models::l2_block::Entity::find()
            .filter(models::l2_block::Column::BlockNumber.gte(from as i64))
            .order_by_asc(models::l2_block::Column::BlockNumber)
            .limit(limit)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Get the highest recorded [`L2Block`].
    async fn get_highest_l2_block(&self) -> Result<Option<L2Block>, DatabaseError> {
        Ok(models::l2_block::Entity::find()
            .order_by_desc(models::l2_block::Column::BlockNumber)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get the lowest recorded [`L2Block`].
    async fn get_lowest_l2_block(&self) -> Result<Option<L2Block>, DatabaseError> {
        Ok(models::l2_block::Entity::find()
            .order_by_asc(models::l2_block::Column::BlockNumber)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Assign the blocks in `[start, end]` to the chunk at `chunk_index`.
    ///
    /// Errors if any block of the range is missing or already assigned.
    async fn assign_l2_blocks_to_chunk(
        &self,
        start: u64,
        end: u64,
        chunk_index: u64,
    ) -> Result<(), DatabaseError> {
        use models::l2_block::Column;
        let result = models::l2_block::Entity::update_many()
            .col_expr(Column::ChunkIndex, Expr::value(chunk_index as i64))
            .filter(Column::BlockNumber.between(start as i64, end as i64))
            .filter(Column::ChunkIndex.is_null())
            .exec(self.get_connection())
            .await?;

        let expected = end - start + 1;
        if result.rows_affected != expected {
            return Err(DatabaseError::AssignmentConflict {
                table: "l2_block",
                start,
                end,
                expected,
                assigned: result.rows_affected,
            });
        }
        Ok(())
    }

    // --- l2 messages ---

    /// Insert an [`L2Message`], overwriting any message recorded at the same queue index.
    async fn upsert_l2_message(&self, message: L2Message) -> Result<(), DatabaseError> {
        use models::l2_message::Column;
        tracing::trace!(target: "scroll::db", queue_index = message.queue_index, "Upserting L2 message.");
        let model: models::l2_message::ActiveModel = message.into();
        models::l2_message::Entity::insert(model)
            .on_conflict(
                OnConflict::column(Column::QueueIndex)
                    .update_columns([Column::MessageHash, Column::BlockNumber, Column::TxHash])
                    .to_owned(),
            )
            .exec(self.get_connection())
            .await?;
        Ok(())
    }

    /// Get the [`L2Message`] at `queue_index`.
    async fn get_l2_message(&self, queue_index: u64) -> Result<Option<L2Message>, DatabaseError> {
        Ok(models::l2_message::Entity::find_by_id(queue_index as i64)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get the messages appended in blocks `[from, to]`, ordered by queue index.
    async fn get_l2_messages_in_range(
        &self,
        from: u64,
        to: u64,
    ) -> Result<Vec<L2Message>, DatabaseError> {
        Ok(models::l2_message::Entity::find()
            .filter(models::l2_message::Column::BlockNumber.between(from as i64, to as i64))
            .order_by_asc(models::l2_message::Column::QueueIndex)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    // --- chunks ---

    /// Insert a [`Chunk`].
    async fn insert_chunk(&self, chunk: Chunk) -> Result<(), DatabaseError> {
        tracing::trace!(target: "scroll::db", chunk_index = chunk.index, start = chunk.start_block_number, end = chunk.end_block_number, "Inserting chunk.");
        let model: models::chunk::ActiveModel = chunk.into();
        model.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Get the [`Chunk`] at `index`.
    async fn get_chunk(&self, index: u64) -> Result<Option<Chunk>, DatabaseError> {
        Ok(models::chunk::Entity::find_by_id(index as i64)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get the chunk with the highest index.
    async fn get_last_chunk(&self) -> Result<Option<Chunk>, DatabaseError> {
        Ok(models::chunk::Entity::find()
            .order_by_desc(models::chunk::Column::Index)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get at most `limit` chunks starting at index `from`, in ascending order.
    async fn get_chunks(&self, from: u64, limit: u64) -> Result<Vec<Chunk>, DatabaseError> {
        Ok(models::chunk::Entity::find()
            .filter(models::chunk::Column::Index.gte(from as i64))
            .order_by_asc(models::chunk::Column::Index)
            .limit(limit)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Assign the chunks in `[start, end]` to the batch at `batch_index`.
    ///
    /// Errors if any chunk of the range is missing or already assigned.
    async fn assign_chunks_to_batch(
        &self,
        start: u64,
        end: u64,
        batch_index: u64,
    ) -> Result<(), DatabaseError> {
        use models::chunk::Column;
        let result = models::chunk::Entity::update_many()
            .col_expr(Column::BatchIndex, Expr::value(batch_index as i64))
            .filter(Column::Index.between(start as i64, end as i64))
            .filter(Column::BatchIndex.is_null())
            .exec(self.get_connection())
            .await?;

        let expected = end - start + 1;
        if result.rows_affected != expected {
            return Err(DatabaseError::AssignmentConflict {
                table: "chunk",
                start,
                end,
                expected,
                assigned: result.rows_affected,
            });
        }
        Ok(())
    }

    // --- batches ---

    /// Insert a [`Batch`].
    async fn insert_batch(&self, batch: Batch) -> Result<(), DatabaseError> {
        tracing::trace!(target: "scroll::db", batch_index = batch.index, batch_hash = ?batch.hash, status = %batch.status, "Inserting batch.");
        let model: models::batch::ActiveModel = batch.into();
        model.insert(self.get_connection()).await?;
        Ok(())
    }

    /// Get the [`Batch`] at `index`.
    async fn get_batch(&self, index: u64) -> Result<Option<Batch>, DatabaseError> {
        Ok(models::batch::Entity::find_by_id(index as i64)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get the batch with the highest index.
    async fn get_last_batch(&self) -> Result<Option<Batch>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .order_by_desc(models::batch::Column::Index)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get at most `limit` batches with `status`, in ascending index order.
    async fn get_batches_by_status(
        &self,
        status: BatchStatus,
        limit: u64,
    ) -> Result<Vec<Batch>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .filter(models::batch::Column::Status.eq(status.as_str()))
            .order_by_asc(models::batch::Column::Index)
            .limit(limit)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Move the batch at `index` from `from` to `to`, recording `at` as the commit or
    /// finalization time when relevant.
    ///
    /// Errors if the transition is not allowed or if the batch is no longer in `from`.
    async fn update_batch_status(
        &self,
        index: u64,
        from: BatchStatus,
        to: BatchStatus,
        at: u64,
    ) -> Result<(), DatabaseError> {
        use models::batch::Column;
        if !from.can_transition_to(to) {
            return Err(DatabaseError::InvalidStatusTransition { index, from, to });
        }
        tracing::trace!(target: "scroll::db", batch_index = index, %from, %to, "Updating batch status.");

        let mut update = models::batch::Entity::update_many()
            .col_expr(Column::Status, Expr::value(to.as_str()));
        match to {
            BatchStatus::Committed => {
                update = update.col_expr(Column::CommittedAt, Expr::value(at as i64))
            }
            BatchStatus::Finalized => {
                update = update.col_expr(Column::FinalizedAt, Expr::value(at as i64))
            }
            _ => {}
        }
        let result = update
            .filter(Column::Index.eq(index as i64))
            .filter(Column::Status.eq(from.as_str()))
            .exec(self.get_connection())
            .await?;

        if result.rows_affected == 0 {
            return Err(DatabaseError::StatusConflict { index, expected: from });
        }
        Ok(())
    }

    /// Count the batches per status.
    async fn count_batches_by_status(&self) -> Result<BTreeMap<BatchStatus, u64>, DatabaseError> {
        let mut counts = BTreeMap::new();
        for status in BatchStatus::iter() {
            let count = models::batch::Entity::find()
                .filter(models::batch::Column::Status.eq(status.as_str()))
                .count(self.get_connection())
                .await?;
            counts.insert(status, count);
        }
        Ok(counts)
    }

    /// Get the lowest-index batch that is neither finalized nor failed.
    async fn get_oldest_unfinished_batch(&self) -> Result<Option<Batch>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .filter(
                models::batch::Column::Status.is_in(UNFINISHED_STATUSES.map(|s| s.as_str())),
            )
            .order_by_asc(models::batch::Column::Index)
            .one(self.get_connection())
            .await?
            .map(Into::into))
    }

    /// Get at most `limit` unfinished batches that have no proof yet, in ascending index order.
    async fn get_batches_awaiting_proof(&self, limit: u64) -> Result<Vec<Batch>, DatabaseError> {
        Ok(models::batch::Entity::find()
            .filter(models::batch::Column::Proof.is_null())
            .filter(
                models::batch::Column::Status.is_in(UNFINISHED_STATUSES.map(|s| s.as_str())),
            )
            .order_by_asc(models::batch::Column::Index)
            .limit(limit)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Set the validity proof of the batch at `index`.
    async fn set_batch_proof(&self, index: u64, proof: Bytes) -> Result<(), DatabaseError> {
        tracing::trace!(target: "scroll::db", batch_index = index, "Setting batch proof.");
        let result = models::batch::Entity::update_many()
            .col_expr(models::batch::Column::Proof, Expr::value(proof.to_vec()))
            .filter(models::batch::Column::Index.eq(index as i64))
            .exec(self.get_connection())
            .await?;
        if result.rows_affected == 0 {
            return Err(DatabaseError::BatchNotFound(index));
        }
        Ok(())
    }

    // --- rollup transactions ---

    /// Insert a [`RollupTransaction`] along with its attempts.
    async fn insert_rollup_transaction(&self, tx: &RollupTransaction) -> Result<(), DatabaseError> {
        tracing::trace!(target: "scroll::db", batch_index = tx.batch_index, kind = %tx.kind, nonce = tx.nonce, "Inserting rollup transaction.");
        let model: models::rollup_transaction::ActiveModel = tx.into();
        model.insert(self.get_connection()).await?;
        for (i, attempt) in tx.attempts.iter().enumerate() {
            models::transaction_attempt::ActiveModel::from_attempt(
                tx.batch_index,
                tx.kind,
                i as u64,
                attempt,
            )
            .insert(self.get_connection())
            .await?;
        }
        Ok(())
    }

    /// Append a broadcast attempt to the transaction of `kind` for the batch at `batch_index`.
    async fn append_transaction_attempt(
        &self,
        batch_index: u64,
        kind: RollupTxKind,
        attempt: &TransactionAttempt,
    ) -> Result<(), DatabaseError> {
        use models::transaction_attempt::Column;
        let existing = models::transaction_attempt::Entity::find()
            .filter(Column::BatchIndex.eq(batch_index as i64))
            .filter(Column::Kind.eq(kind.as_str()))
            .count(self.get_connection())
            .await?;
        if existing == 0 {
            return Err(DatabaseError::TransactionNotFound { batch_index, kind });
        }
        tracing::trace!(target: "scroll::db", batch_index, %kind, attempt = existing, tx_hash = ?attempt.hash, "Appending transaction attempt.");
        models::transaction_attempt::ActiveModel::from_attempt(
            batch_index,
            kind,
            existing,
            attempt,
        )
        .insert(self.get_connection())
        .await?;
        Ok(())
    }

    /// Get the transaction of `kind` for the batch at `batch_index`, with its attempts.
    async fn get_rollup_transaction(
        &self,
        batch_index: u64,
        kind: RollupTxKind,
    ) -> Result<Option<RollupTransaction>, DatabaseError> {
        let Some(model) = models::rollup_transaction::Entity::find_by_id(
            models::rollup_transaction::primary_key(batch_index, kind),
        )
        .one(self.get_connection())
        .await?
        else {
            return Ok(None);
        };
        let attempts = self.get_transaction_attempts(batch_index, kind).await?;
        Ok(Some(model.into_transaction(attempts)))
    }

    /// Get the attempts of the transaction of `kind` for the batch at `batch_index`, oldest
    /// first.
    async fn get_transaction_attempts(
        &self,
        batch_index: u64,
        kind: RollupTxKind,
    ) -> Result<Vec<TransactionAttempt>, DatabaseError> {
        use models::transaction_attempt::Column;
        Ok(models::transaction_attempt::Entity::find()
            .filter(Column::BatchIndex.eq(batch_index as i64))
            .filter(Column::Kind.eq(kind.as_str()))
            .order_by_asc(Column::Attempt)
            .all(self.get_connection())
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Set the status of the transaction of `kind` for the batch at `batch_index`.
    async fn set_rollup_transaction_status(
        &self,
        batch_index: u64,
        kind: RollupTxKind,
        status: RollupTxStatus,
    ) -> Result<(), DatabaseError> {
        use models::rollup_transaction::Column;
        tracing::trace!(target: "scroll::db", batch_index, %kind, %status, "Updating rollup transaction status.");
        let result = models::rollup_transaction::Entity::update_many()
            .col_expr(Column::Status, Expr::value(status.as_str()))
            .filter(Column::BatchIndex.eq(batch_index as i64))
            .filter(Column::Kind.eq(kind.as_str()))
            .exec(self.get_connection())
            .await?;
        if result.rows_affected == 0 {
            return Err(DatabaseError::TransactionNotFound { batch_index, kind });
        }
        Ok(())
    }

    /// Get every transaction still awaiting confirmation or cancellation, in ascending nonce
    /// order.
    async fn get_pending_rollup_transactions(
        &self,
    ) -> Result<Vec<RollupTransaction>, DatabaseError> {
        let models = models::rollup_transaction::Entity::find()
            .filter(models::rollup_transaction::Column::Status.is_in([
                RollupTxStatus::Pending.as_str(),
                RollupTxStatus::Cancelling.as_str(),
            ]))
            .order_by_asc(models::rollup_transaction::Column::Nonce)
            .all(self.get_connection())
            .await?;

        let mut transactions = Vec::with_capacity(models.len());
        for model in models {
            let batch_index = model.batch_index as u64;
            let kind = model.kind.parse().map_err(|_| {
                sea_orm::DbErr::Custom(format!("invalid transaction kind {}", model.kind))
            })?;
            let attempts = self.get_transaction_attempts(batch_index, kind).await?;
            transactions.push(model.into_transaction(attempts));
        }
        Ok(transactions)
    }

    // --- genesis ---

    /// Record the L2 genesis `block` as chunk 0 and batch 0, the latter already finalized.
    async fn insert_genesis(
        &self,
        block: L2Block,
        created_at: u64,
    ) -> Result<Batch, DatabaseError> {
        if block.number != 0 {
            return Err(DatabaseError::InvalidGenesis(block.number));
        }
        let mut chunk = Chunk::from_blocks(0, B256::ZERO, std::slice::from_ref(&block), created_at)
            .ok_or(DatabaseError::InvalidGenesis(block.number))?;
        chunk.batch_index = Some(0);
        let mut batch =
            Batch::from_chunks(0, B256::ZERO, &[chunk], BatchCost::default(), created_at)
                .ok_or(DatabaseError::InvalidGenesis(block.number))?;
        batch.status = BatchStatus::Finalized;
        batch.committed_at = Some(created_at);
        batch.finalized_at = Some(created_at);

        tracing::info!(target: "scroll::db", genesis_hash = ?block.hash, batch_hash = ?batch.hash, "Importing genesis.");
        self.upsert_l2_block(block).await?;
        self.insert_chunk(chunk).await?;
        self.assign_l2_blocks_to_chunk(0, 0, 0).await?;
        self.insert_batch(batch.clone()).await?;
        if self.get_l2_watermark().await?.is_none() {
            self.set_metadata(L2_WATERMARK_KEY, 0.to_string()).await?;
        }
        Ok(batch)
    }
}

impl<T> DatabaseOperations for T where T: DatabaseConnectionProvider + Sync {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use rollup_relayer_primitives::{random, GasParams};

    fn chain(start: u64, len: u64) -> Vec<L2Block> {
        let mut parent = B256::with_last_byte(0xff);
        (start..start + len)
            .map(|number| {
                let mut block = random!(L2Block);
                block.number = number;
                block.parent_hash = parent;
                parent = block.hash;
                block
            })
            .collect()
    }

    #[tokio::test]
    async fn test_l2_block_upsert_preserves_chunk_assignment() -> eyre::Result<()> {
        // Given
        let db = setup_test_db().await;
        let mut blocks = chain(1, 3);
        let transactions = vec![Bytes::from_static(&[0x02, 0x01]), Bytes::from_static(&[0xc0])];
        blocks[0] = blocks[0].clone().with_transactions(transactions);
        for block in &blocks {
            db.upsert_l2_block(block.clone()).await?;
        }
        db.assign_l2_blocks_to_chunk(1, 2, 0).await?;

        // When
        db.upsert_l2_block(blocks[0].clone()).await?;

        // Then
        assert_eq!(db.get_l2_block(1).await?, Some(blocks[0].clone()));
        assert_eq!(db.get_l2_block(1).await?.unwrap().transactions.len(), 2);
        assert_eq!(db.get_highest_l2_block().await?, Some(blocks[2].clone()));
        assert_eq!(db.get_lowest_l2_block().await?, Some(blocks[0].clone()));
        assert_eq!(db.get_l2_blocks(2, 10).await?, blocks[1..].to_vec());
        let err = db.assign_l2_blocks_to_chunk(2, 3, 1).await.unwrap_err();
        assert!(matches!(err, DatabaseError::AssignmentConflict { assigned: 1, expected: 2, .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_watermark_compare_and_set() -> eyre::Result<()> {
        let db = setup_test_db().await;

        db.compare_and_set_l2_watermark(None, 10).await?;
        assert_eq!(db.get_l2_watermark().await?, Some(10));

        let err = db.compare_and_set_l2_watermark(Some(9), 12).await.unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::WatermarkConflict { expected: Some(9), found: Some(10) }
        ));

        db.compare_and_set_l2_watermark(Some(10), 12).await?;
        assert_eq!(db.get_l2_watermark().await?, Some(12));

        Ok(())
    }

    #[tokio::test]
    async fn test_nonce_allocation() -> eyre::Result<()> {
        let db = setup_test_db().await;
        let address = Address::repeat_byte(1);

        assert!(matches!(
            db.allocate_nonce(address).await,
            Err(DatabaseError::NonceNotInitialized(_))
        ));

        assert_eq!(db.sync_next_nonce(address, 5).await?, 5);
        assert_eq!(db.allocate_nonce(address).await?, 5);
        assert_eq!(db.allocate_nonce(address).await?, 6);

        // a lower chain nonce never moves the counter backwards.
        assert_eq!(db.sync_next_nonce(address, 3).await?, 7);
        assert_eq!(db.sync_next_nonce(address, 9).await?, 9);
        assert_eq!(db.allocate_nonce(address).await?, 9);

        Ok(())
    }

    #[tokio::test]
    async fn test_batch_status_compare_and_swap() -> eyre::Result<()> {
        // Given
        let db = setup_test_db().await;
        let chunk = Chunk::from_blocks(0, B256::ZERO, &chain(1, 2), 0).unwrap();
        let batch = Batch::from_chunks(0, B256::ZERO, &[chunk], BatchCost::default(), 0).unwrap();
        db.insert_batch(batch).await?;

        // When
        db.update_batch_status(0, BatchStatus::Unassigned, BatchStatus::PendingCommit, 1).await?;
        let stale =
            db.update_batch_status(0, BatchStatus::Unassigned, BatchStatus::PendingCommit, 2).await;
        let backwards =
            db.update_batch_status(0, BatchStatus::PendingCommit, BatchStatus::Unassigned, 2).await;
        db.update_batch_status(0, BatchStatus::PendingCommit, BatchStatus::Committed, 3).await?;

        // Then
        assert!(matches!(stale, Err(DatabaseError::StatusConflict { index: 0, .. })));
        assert!(matches!(backwards, Err(DatabaseError::InvalidStatusTransition { .. })));
        let batch = db.get_batch(0).await?.unwrap();
        assert_eq!(batch.status, BatchStatus::Committed);
        assert_eq!(batch.committed_at, Some(3));
        assert_eq!(db.count_batches_by_status().await?[&BatchStatus::Committed], 1);
        assert_eq!(db.get_oldest_unfinished_batch().await?.map(|b| b.index), Some(0));

        Ok(())
    }

    #[tokio::test]
    async fn test_batch_proof_queue() -> eyre::Result<()> {
        let db = setup_test_db().await;
        let blocks = chain(1, 2);
        for (index, block) in blocks.iter().enumerate() {
            let chunk = Chunk::from_blocks(index as u64, B256::ZERO, std::slice::from_ref(block), 0).unwrap();
            let batch =
                Batch::from_chunks(index as u64, B256::ZERO, &[chunk], BatchCost::default(), 0)
                    .unwrap();
            db.insert_batch(batch).await?;
        }

        db.set_batch_proof(0, Bytes::from_static(&[1, 2, 3])).await?;

        let awaiting = db.get_batches_awaiting_proof(10).await?;
        assert_eq!(awaiting.iter().map(|b| b.index).collect::<Vec<_>>(), vec![1]);
        assert_eq!(db.get_batch(0).await?.unwrap().proof, Some(Bytes::from_static(&[1, 2, 3])));
        assert!(matches!(
            db.set_batch_proof(5, Bytes::new()).await,
            Err(DatabaseError::BatchNotFound(5))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_rollup_transaction_attempts() -> eyre::Result<()> {
        // Given
        let db = setup_test_db().await;
        let attempt = |byte: u8, fee: u128| TransactionAttempt {
            hash: B256::repeat_byte(byte),
            gas: GasParams {
                gas_limit: 100_000,
                max_fee_per_gas: fee,
                max_priority_fee_per_gas: fee / 10,
            },
            raw: Bytes::from(vec![byte; 4]),
            submitted_at: byte as u64,
        };
        let tx = RollupTransaction {
            batch_index: 3,
            kind: RollupTxKind::Commit,
            sender: Address::repeat_byte(2),
            nonce: 7,
            status: RollupTxStatus::Pending,
            attempts: vec![attempt(1, 100)],
        };

        // When
        let tx_mut = db.tx_mut().await?;
        tx_mut.insert_rollup_transaction(&tx).await?;
        tx_mut.append_transaction_attempt(3, RollupTxKind::Commit, &attempt(2, u128::MAX)).await?;
        tx_mut.commit().await?;

        // Then
        let stored = db.get_rollup_transaction(3, RollupTxKind::Commit).await?.unwrap();
        assert_eq!(stored.attempts, vec![attempt(1, 100), attempt(2, u128::MAX)]);
        assert_eq!(stored.replacements(), 1);
        assert_eq!(db.get_pending_rollup_transactions().await?, vec![stored]);
        assert!(db.get_rollup_transaction(3, RollupTxKind::Finalize).await?.is_none());

        db.set_rollup_transaction_status(3, RollupTxKind::Commit, RollupTxStatus::Cancelling)
            .await?;
        let pending = db.get_pending_rollup_transactions().await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, RollupTxStatus::Cancelling);

        db.set_rollup_transaction_status(3, RollupTxKind::Commit, RollupTxStatus::Confirmed)
            .await?;
        assert!(db.get_pending_rollup_transactions().await?.is_empty());
        assert!(matches!(
            db.append_transaction_attempt(4, RollupTxKind::Commit, &attempt(3, 1)).await,
            Err(DatabaseError::TransactionNotFound { batch_index: 4, .. })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() -> eyre::Result<()> {
        let db = setup_test_db().await;
        let block = chain(1, 1).remove(0);

        let tx = db.tx_mut().await?;
        tx.upsert_l2_block(block).await?;
        tx.compare_and_set_l2_watermark(None, 1).await?;
        tx.rollback().await?;

        assert!(db.get_l2_block(1).await?.is_none());
        assert!(db.get_l2_watermark().await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_genesis() -> eyre::Result<()> {
        let db = setup_test_db().await;
        let mut genesis = chain(0, 1).remove(0);

        let batch = db.insert_genesis(genesis.clone(), 42).await?;

        assert_eq!(batch.status, BatchStatus::Finalized);
        assert_eq!(db.get_batch(0).await?, Some(batch));
        assert_eq!(db.get_last_chunk().await?.unwrap().batch_index, Some(0));
        assert_eq!(db.get_l2_watermark().await?, Some(0));

        genesis.number = 1;
        assert!(matches!(
            db.insert_genesis(genesis, 42).await,
            Err(DatabaseError::InvalidGenesis(1))
        ));

        Ok(())
    }
}
