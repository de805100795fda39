//! Primitive types for the rollup relayer.

pub use batch::{Batch, BatchCost, BatchStatus};
mod batch;

pub use block::{L2Block, TX_LENGTH_PREFIX_SIZE};
mod block;

pub use chunk::Chunk;
mod chunk;

pub use message::L2Message;
mod message;

pub use transaction::{
    GasParams, RollupTransaction, RollupTxKind, RollupTxStatus, TransactionAttempt,
};
mod transaction;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current unix timestamp in seconds.
pub fn unix_timestamp() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}

/// Returns an arbitrary instance of the passed type.
#[cfg(feature = "arbitrary")]
#[macro_export]
macro_rules! random {
    ($typ: ty) => {{
        let mut bytes = Box::new([0u8; 1024]);
        let mut rng = ::rand::rng();
        ::rand::RngCore::fill_bytes(&mut rng, bytes.as_mut_slice());
        let mut u = ::arbitrary::Unstructured::new(bytes.as_slice());
        <$typ as ::arbitrary::Arbitrary>::arbitrary(&mut u).unwrap()
    }};
}
