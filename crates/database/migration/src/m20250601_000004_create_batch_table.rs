use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Batch::Table)
                    .if_not_exists()
                    .col(big_integer(Batch::Index).primary_key())
                    .col(binary_len(Batch::Hash, 32))
                    .col(binary_len(Batch::ParentHash, 32))
                    .col(binary_len(Batch::DataHash, 32))
                    .col(big_integer(Batch::StartChunkIndex))
                    .col(big_integer(Batch::EndChunkIndex))
                    .col(big_integer(Batch::StartBlockNumber))
                    .col(big_integer(Batch::EndBlockNumber))
                    .col(binary_len(Batch::PrevStateRoot, 32))
                    .col(binary_len(Batch::PostStateRoot, 32))
                    .col(binary_len(Batch::WithdrawRoot, 32))
                    .col(big_integer(Batch::CalldataSize))
                    .col(big_integer(Batch::ProofCost))
                    .col(big_integer(Batch::CommitGas))
                    .col(string(Batch::Status))
                    .col(binary_null(Batch::Proof))
                    .col(big_integer(Batch::CreatedAt))
                    .col(big_integer_null(Batch::CommittedAt))
                    .col(big_integer_null(Batch::FinalizedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Batch::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Batch {
    Table,
    Index,
    Hash,
    ParentHash,
    DataHash,
    StartChunkIndex,
    EndChunkIndex,
    StartBlockNumber,
    EndBlockNumber,
    PrevStateRoot,
    PostStateRoot,
    WithdrawRoot,
    CalldataSize,
    ProofCost,
    CommitGas,
    Status,
    Proof,
    CreatedAt,
    CommittedAt,
    FinalizedAt,
}
