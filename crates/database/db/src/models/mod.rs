/// This module contains the database model for an L2 block.
pub mod l2_block;

/// This module contains the database model for an L2 message.
pub mod l2_message;

/// This module contains the database model for a chunk.
pub mod chunk;

/// This module contains the database model for a batch.
pub mod batch;

/// This module contains the database model for a rollup transaction.
pub mod rollup_transaction;

/// This module contains the database model for a rollup transaction broadcast attempt.
pub mod transaction_attempt;

/// This module contains the database model for metadata.
pub mod metadata;
