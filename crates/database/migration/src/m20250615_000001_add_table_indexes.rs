use super::{
    m20250601_000001_create_l2_block_table::L2Block,
    m20250601_000002_create_l2_message_table::L2Message,
    m20250601_000003_create_chunk_table::Chunk, m20250601_000004_create_batch_table::Batch,
    m20250601_000005_create_rollup_transaction_table::{RollupTransaction, TransactionAttempt},
};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .name("idx_l2_block_chunk_index")
                    .col(L2Block::ChunkIndex)
                    .table(L2Block::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_l2_message_block_number")
                    .col(L2Message::BlockNumber)
                    .table(L2Message::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_chunk_batch_index")
                    .col(Chunk::BatchIndex)
                    .table(Chunk::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_batch_status")
                    .col(Batch::Status)
                    .table(Batch::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_rollup_transaction_status")
                    .col(RollupTransaction::Status)
                    .table(RollupTransaction::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_transaction_attempt_hash")
                    .col(TransactionAttempt::Hash)
                    .table(TransactionAttempt::Table)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table) in [
            ("idx_l2_block_chunk_index", L2Block::Table.into_iden()),
            ("idx_l2_message_block_number", L2Message::Table.into_iden()),
            ("idx_chunk_batch_index", Chunk::Table.into_iden()),
            ("idx_batch_status", Batch::Table.into_iden()),
            ("idx_rollup_transaction_status", RollupTransaction::Table.into_iden()),
            ("idx_transaction_attempt_hash", TransactionAttempt::Table.into_iden()),
        ] {
            manager.drop_index(Index::drop().name(name).table(table).to_owned()).await?;
        }
        Ok(())
    }
}
