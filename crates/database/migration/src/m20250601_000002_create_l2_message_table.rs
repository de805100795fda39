use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(L2Message::Table)
                    .if_not_exists()
                    .col(big_integer(L2Message::QueueIndex).primary_key())
                    .col(binary_len(L2Message::MessageHash, 32))
                    .col(big_integer(L2Message::BlockNumber))
                    .col(binary_len(L2Message::TxHash, 32))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(L2Message::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum L2Message {
    Table,
    QueueIndex,
    MessageHash,
    BlockNumber,
    TxHash,
}
