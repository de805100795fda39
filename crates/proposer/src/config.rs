use std::{fmt, str::FromStr, time::Duration};

/// How the age of an open proposal is measured against its timeout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ProposalTimeoutMode {
    /// The age of the oldest unit of the proposal, from its own timestamp.
    #[default]
    OldestUnit,
    /// The time since the last proposal was closed, falling back to the age of the oldest unit
    /// when nothing was proposed yet.
    LastProposal,
}

impl FromStr for ProposalTimeoutMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oldest-unit" | "oldest_unit" => Ok(Self::OldestUnit),
            "last-proposal" | "last_proposal" => Ok(Self::LastProposal),
            _ => Err(format!("Expected 'oldest-unit' or 'last-proposal', got '{s}'")),
        }
    }
}

impl fmt::Display for ProposalTimeoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OldestUnit => write!(f, "oldest-unit"),
            Self::LastProposal => write!(f, "last-proposal"),
        }
    }
}

impl ProposalTimeoutMode {
    /// Returns true if a proposal whose oldest unit has `oldest_timestamp` timed out at `now`.
    pub(crate) fn is_expired(
        &self,
        timeout: Duration,
        now: u64,
        oldest_timestamp: u64,
        last_proposal: Option<u64>,
    ) -> bool {
        let since = match self {
            Self::OldestUnit => oldest_timestamp,
            Self::LastProposal => last_proposal.unwrap_or(oldest_timestamp),
        };
        now.saturating_sub(since) >= timeout.as_secs()
    }
}

/// Configuration for the [`crate::ChunkProposer`].
#[derive(Debug, Clone, Copy)]
pub struct ChunkProposerConfig {
    /// The maximum number of blocks in a chunk.
    pub max_block_num_per_chunk: u64,
    /// The maximum number of transactions in a chunk.
    pub max_tx_num_per_chunk: u64,
    /// The maximum transaction payload size of a chunk in bytes.
    pub max_payload_size_per_chunk: u64,
    /// The maximum row consumption of a chunk.
    pub max_row_consumption_per_chunk: u64,
    /// The age after which a chunk under the ceilings is closed.
    pub chunk_timeout: Duration,
    /// How the age of an open chunk is measured.
    pub timeout_mode: ProposalTimeoutMode,
}

impl Default for ChunkProposerConfig {
    fn default() -> Self {
        Self {
            max_block_num_per_chunk: 100,
            max_tx_num_per_chunk: 1_000,
            max_payload_size_per_chunk: 120_000,
            max_row_consumption_per_chunk: 1_000_000,
            chunk_timeout: Duration::from_secs(300),
            timeout_mode: ProposalTimeoutMode::default(),
        }
    }
}

/// Configuration for the [`crate::BatchProposer`].
#[derive(Debug, Clone, Copy)]
pub struct BatchProposerConfig {
    /// The maximum number of chunks in a batch.
    pub max_chunk_num_per_batch: u64,
    /// The maximum estimated commit calldata size of a batch in bytes.
    pub max_calldata_size_per_batch: u64,
    /// The maximum estimated proving cost of a batch.
    pub max_proof_cost_per_batch: u64,
    /// The maximum estimated L1 gas of the commit transaction of a batch.
    pub max_commit_gas_per_batch: u64,
    /// The age after which a batch under the ceilings is closed.
    pub batch_timeout: Duration,
    /// How the age of an open batch is measured.
    pub timeout_mode: ProposalTimeoutMode,
}

impl Default for BatchProposerConfig {
    fn default() -> Self {
        Self {
            max_chunk_num_per_batch: 15,
            max_calldata_size_per_batch: 500_000,
            max_proof_cost_per_batch: 10_000_000,
            max_commit_gas_per_batch: 10_000_000,
            batch_timeout: Duration::from_secs(900),
            timeout_mode: ProposalTimeoutMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_mode_from_str() {
        assert_eq!("oldest-unit".parse(), Ok(ProposalTimeoutMode::OldestUnit));
        assert_eq!("Last_Proposal".parse(), Ok(ProposalTimeoutMode::LastProposal));
        assert!("sometimes".parse::<ProposalTimeoutMode>().is_err());

        let mode = ProposalTimeoutMode::LastProposal;
        assert_eq!(mode.to_string().parse(), Ok(mode));
    }

    #[test]
    fn test_timeout_expiry() {
        let timeout = Duration::from_secs(10);

        let mode = ProposalTimeoutMode::OldestUnit;
        assert!(!mode.is_expired(timeout, 109, 100, Some(105)));
        assert!(mode.is_expired(timeout, 110, 100, Some(105)));

        let mode = ProposalTimeoutMode::LastProposal;
        assert!(!mode.is_expired(timeout, 110, 100, Some(105)));
        assert!(mode.is_expired(timeout, 115, 100, Some(105)));
        assert!(mode.is_expired(timeout, 110, 100, None));

        // A unit timestamped in the future never expires early.
        assert!(!mode.is_expired(timeout, 100, 200, None));
    }
}
