//! The crate exposes the L1 and L2 client seams of the relayer along with their alloy backed
//! implementations.

pub use error::{ProviderError, SendErrorKind};
mod error;

pub use l1::{AlloyL1Provider, L1Provider, TransactionReceiptInfo};
mod l1;

pub use l2::{AlloyL2Provider, L2Contracts, L2Provider};
mod l2;

pub use timeout::TimeoutProvider;
mod timeout;

#[cfg(any(test, feature = "test-utils"))]
/// Common test helpers
pub mod test_utils;
