use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(L2Block::Table)
                    .if_not_exists()
                    .col(big_integer(L2Block::BlockNumber).primary_key())
                    .col(binary_len(L2Block::BlockHash, 32))
                    .col(binary_len(L2Block::ParentHash, 32))
                    .col(binary_len(L2Block::StateRoot, 32))
                    .col(binary_len(L2Block::WithdrawRoot, 32))
                    .col(big_integer(L2Block::Timestamp))
                    .col(big_integer(L2Block::TxNum))
                    .col(binary(L2Block::Transactions))
                    .col(big_integer(L2Block::PayloadSize))
                    .col(big_integer(L2Block::RowConsumption))
                    .col(big_integer_null(L2Block::ChunkIndex))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(L2Block::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum L2Block {
    Table,
    BlockNumber,
    BlockHash,
    ParentHash,
    StateRoot,
    WithdrawRoot,
    Timestamp,
    TxNum,
    Transactions,
    PayloadSize,
    RowConsumption,
    ChunkIndex,
}
