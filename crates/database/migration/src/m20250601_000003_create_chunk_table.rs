use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chunk::Table)
                    .if_not_exists()
                    .col(big_integer(Chunk::Index).primary_key())
                    .col(binary_len(Chunk::Hash, 32))
                    .col(big_integer(Chunk::StartBlockNumber))
                    .col(binary_len(Chunk::StartBlockHash, 32))
                    .col(big_integer(Chunk::StartBlockTimestamp))
                    .col(big_integer(Chunk::EndBlockNumber))
                    .col(binary_len(Chunk::EndBlockHash, 32))
                    .col(binary_len(Chunk::PrevStateRoot, 32))
                    .col(binary_len(Chunk::PostStateRoot, 32))
                    .col(binary_len(Chunk::WithdrawRoot, 32))
                    .col(big_integer(Chunk::TxNum))
                    .col(big_integer(Chunk::PayloadSize))
                    .col(big_integer(Chunk::RowConsumption))
                    .col(big_integer(Chunk::CreatedAt))
                    .col(big_integer_null(Chunk::BatchIndex))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Chunk::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Chunk {
    Table,
    Index,
    Hash,
    StartBlockNumber,
    StartBlockHash,
    StartBlockTimestamp,
    EndBlockNumber,
    EndBlockHash,
    PrevStateRoot,
    PostStateRoot,
    WithdrawRoot,
    TxNum,
    PayloadSize,
    RowConsumption,
    CreatedAt,
    BatchIndex,
}
