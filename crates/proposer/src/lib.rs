//! Chunk and batch proposers for the rollup relayer.
//!
//! Both proposers share the same greedy policy: units are accumulated in order until the next
//! one would cross a ceiling, a first unit that crosses a ceiling alone forms a proposal by
//! itself, and a proposal under the ceilings is closed once it times out.

mod batch;
pub use batch::{
    estimate_chunk_calldata_size, BatchProposer, BatchUsage, BASE_COMMIT_GAS,
    BLOCK_CONTEXT_SIZE, CALLDATA_GAS_PER_BYTE, CHUNK_COMMIT_GAS,
};

mod chunk;
pub use chunk::{ChunkProposer, ChunkUsage};

mod config;
pub use config::{BatchProposerConfig, ChunkProposerConfig, ProposalTimeoutMode};

mod error;
pub use error::ProposerError;

mod greedy;
pub use greedy::CloseReason;

mod metrics;
pub use metrics::{BatchProposerMetrics, ChunkProposerMetrics};
