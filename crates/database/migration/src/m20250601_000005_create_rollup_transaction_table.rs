use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RollupTransaction::Table)
                    .if_not_exists()
                    .col(big_integer(RollupTransaction::BatchIndex))
                    .col(string(RollupTransaction::Kind))
                    .col(binary_len(RollupTransaction::Sender, 20))
                    .col(big_integer(RollupTransaction::Nonce))
                    .col(string(RollupTransaction::Status))
                    .primary_key(
                        Index::create()
                            .col(RollupTransaction::BatchIndex)
                            .col(RollupTransaction::Kind),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per broadcast, replacements append a row with the next attempt number.
        manager
            .create_table(
                Table::create()
                    .table(TransactionAttempt::Table)
                    .if_not_exists()
                    .col(big_integer(TransactionAttempt::BatchIndex))
                    .col(string(TransactionAttempt::Kind))
                    .col(big_integer(TransactionAttempt::Attempt))
                    .col(binary_len(TransactionAttempt::Hash, 32))
                    .col(big_integer(TransactionAttempt::GasLimit))
                    .col(string(TransactionAttempt::MaxFeePerGas))
                    .col(string(TransactionAttempt::MaxPriorityFeePerGas))
                    .col(binary(TransactionAttempt::Raw))
                    .col(big_integer(TransactionAttempt::SubmittedAt))
                    .primary_key(
                        Index::create()
                            .col(TransactionAttempt::BatchIndex)
                            .col(TransactionAttempt::Kind)
                            .col(TransactionAttempt::Attempt),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(TransactionAttempt::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(RollupTransaction::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub(crate) enum RollupTransaction {
    Table,
    BatchIndex,
    Kind,
    Sender,
    Nonce,
    Status,
}

#[derive(DeriveIden)]
pub(crate) enum TransactionAttempt {
    Table,
    BatchIndex,
    Kind,
    Attempt,
    Hash,
    GasLimit,
    MaxFeePerGas,
    MaxPriorityFeePerGas,
    Raw,
    SubmittedAt,
}
