pub use sea_orm_migration::prelude::*;

mod m20250601_000001_create_l2_block_table;
mod m20250601_000002_create_l2_message_table;
mod m20250601_000003_create_chunk_table;
mod m20250601_000004_create_batch_table;
mod m20250601_000005_create_rollup_transaction_table;
mod m20250601_000006_create_metadata_table;
mod m20250615_000001_add_table_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_l2_block_table::Migration),
            Box::new(m20250601_000002_create_l2_message_table::Migration),
            Box::new(m20250601_000003_create_chunk_table::Migration),
            Box::new(m20250601_000004_create_batch_table::Migration),
            Box::new(m20250601_000005_create_rollup_transaction_table::Migration),
            Box::new(m20250601_000006_create_metadata_table::Migration),
            Box::new(m20250615_000001_add_table_indexes::Migration),
        ]
    }
}
