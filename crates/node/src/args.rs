use crate::{constants, RollupRelayerConfig, UnitIntervals};

use alloy_primitives::{hex, Address, U256};
use alloy_signer_local::PrivateKeySigner;
use rollup_relayer_l1::L1RelayerConfig;
use rollup_relayer_proposer::{BatchProposerConfig, ChunkProposerConfig, ProposalTimeoutMode};
use rollup_relayer_providers::L2Contracts;
use rollup_relayer_watcher::L2WatcherConfig;
use std::{fs, path::PathBuf, time::Duration};

/// The largest block count of a chunk, as encoded in a single byte of the commit calldata.
const MAX_BLOCK_NUM_PER_CHUNK: u64 = u8::MAX as u64;

/// The arguments of the rollup relayer.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "rollup-relayer", about = "Commits and finalizes L2 batches on L1")]
pub struct RollupRelayerArgs {
    /// Database args.
    #[command(flatten)]
    pub database_args: DatabaseArgs,
    /// The L2 arguments.
    #[command(flatten)]
    pub l2_args: L2Args,
    /// The L1 arguments.
    #[command(flatten)]
    pub l1_args: L1Args,
    /// The signer arguments.
    #[command(flatten)]
    pub signer_args: SignerArgs,
    /// The chunk proposer arguments.
    #[command(flatten)]
    pub chunk_args: ChunkProposerArgs,
    /// The batch proposer arguments.
    #[command(flatten)]
    pub batch_args: BatchProposerArgs,
    /// The L1 relayer arguments.
    #[command(flatten)]
    pub relayer_args: RelayerArgs,
    /// The scheduling arguments.
    #[command(flatten)]
    pub schedule_args: ScheduleArgs,
    /// Import the L2 genesis block as chunk 0 and batch 0 on first start.
    #[arg(long = "import-genesis", env = "ROLLUP_RELAYER_IMPORT_GENESIS")]
    pub import_genesis: bool,
}

impl RollupRelayerArgs {
    /// Validates the combination of the arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.signer_args.key_file.is_some() == self.signer_args.private_key.is_some() {
            return Err("Exactly one of --signer.key-file and --signer.private-key is required"
                .to_string());
        }
        if self.relayer_args.rollup_contract == Address::ZERO {
            return Err("The rollup contract address is required".to_string());
        }
        if self.chunk_args.max_block_num == 0 || self.batch_args.max_chunk_num == 0 {
            return Err("Chunk and batch count ceilings must be positive".to_string());
        }
        if self.chunk_args.max_block_num > MAX_BLOCK_NUM_PER_CHUNK {
            return Err(format!(
                "The chunk block count ceiling must not exceed {MAX_BLOCK_NUM_PER_CHUNK}"
            ));
        }
        if self.schedule_args.has_zero_interval() {
            return Err("Schedule intervals must be positive".to_string());
        }
        Ok(())
    }

    /// Returns the [`RollupRelayerConfig`] for an L1 chain with id `chain_id`.
    pub fn config(&self, chain_id: u64) -> RollupRelayerConfig {
        RollupRelayerConfig {
            watcher: self.l2_args.watcher_config(),
            chunk_proposer: self.chunk_args.config(),
            batch_proposer: self.batch_args.config(),
            relayer: self.relayer_args.config(chain_id),
            intervals: self.schedule_args.intervals(),
            shutdown_timeout: Duration::from_secs(self.schedule_args.shutdown_timeout),
            import_genesis: self.import_genesis,
        }
    }
}

/// The database arguments.
#[derive(Debug, Clone, clap::Args)]
pub struct DatabaseArgs {
    /// The database path.
    #[arg(
        long = "db.path",
        env = "ROLLUP_RELAYER_DB_PATH",
        value_name = "DB_PATH",
        default_value = "rollup-relayer.db"
    )]
    pub path: PathBuf,
}

impl DatabaseArgs {
    /// Returns the sqlite URL of the database, creating the file if missing.
    pub fn url(&self) -> String {
        // append using strings as `join(...)` would overwrite "sqlite://" for absolute paths.
        "sqlite://".to_string() + &*self.path.to_string_lossy() + "?mode=rwc"
    }
}

/// The arguments for the L2 node.
#[derive(Debug, Clone, clap::Args)]
pub struct L2Args {
    /// The URL for the L2 RPC.
    #[arg(long = "l2.url", id = "l2_url", env = "ROLLUP_RELAYER_L2_URL", value_name = "L2_URL")]
    pub url: reqwest::Url,
    /// The number of blocks behind the L2 tip at which a block is final.
    #[arg(long = "l2.confirmations", id = "l2_confirmations", default_value_t = 0)]
    pub confirmations: u64,
    /// The first block to record on an empty database.
    #[arg(long = "l2.start-block", default_value_t = 0)]
    pub start_block: u64,
    /// The maximum number of blocks recorded per watcher tick.
    #[arg(long = "l2.fetch-limit", default_value_t = 100)]
    pub fetch_limit: u64,
    /// The address of the L2 message queue.
    #[arg(long = "l2.message-queue", value_name = "ADDRESS", default_value_t = Address::ZERO)]
    pub message_queue: Address,
    /// The address of the L2 scroll messenger.
    #[arg(long = "l2.messenger", value_name = "ADDRESS", default_value_t = Address::ZERO)]
    pub messenger: Address,
    /// The storage slot of the withdraw trie root in the message queue.
    #[arg(long = "l2.withdraw-trie-root-slot", default_value_t = constants::WITHDRAW_TRIE_ROOT_SLOT)]
    pub withdraw_trie_root_slot: u64,
    /// The compute units per second for the provider.
    #[arg(long = "l2.cups", id = "l2_compute_units_per_second", default_value_t = constants::PROVIDER_COMPUTE_UNITS_PER_SECOND)]
    pub compute_units_per_second: u64,
    /// The max amount of retries for the provider.
    #[arg(long = "l2.max-retries", id = "l2_max_retries", default_value_t = constants::PROVIDER_MAX_RETRIES)]
    pub max_retries: u32,
    /// The initial backoff for the provider, in milliseconds.
    #[arg(long = "l2.initial-backoff", id = "l2_initial_backoff", default_value_t = constants::PROVIDER_INITIAL_BACKOFF)]
    pub initial_backoff: u64,
    /// The timeout of a single L2 RPC call, in seconds.
    #[arg(long = "l2.rpc-timeout", id = "l2_rpc_timeout", default_value_t = constants::RPC_TIMEOUT_SECS)]
    pub rpc_timeout: u64,
}

impl L2Args {
    /// Returns the observed L2 contracts.
    pub fn contracts(&self) -> L2Contracts {
        L2Contracts {
            message_queue: self.message_queue,
            messenger: self.messenger,
            withdraw_trie_root_slot: U256::from(self.withdraw_trie_root_slot),
        }
    }

    fn watcher_config(&self) -> L2WatcherConfig {
        L2WatcherConfig {
            confirmations: self.confirmations,
            start_block: self.start_block,
            fetch_limit: self.fetch_limit,
            message_queue: self.message_queue,
            messenger: self.messenger,
        }
    }
}

/// The arguments for the L1 node.
#[derive(Debug, Clone, clap::Args)]
pub struct L1Args {
    /// The URL for the L1 RPC.
    #[arg(long = "l1.url", id = "l1_url", env = "ROLLUP_RELAYER_L1_URL", value_name = "L1_URL")]
    pub url: reqwest::Url,
    /// The L1 chain id, fetched from the L1 node if missing.
    #[arg(long = "l1.chain-id", id = "l1_chain_id")]
    pub chain_id: Option<u64>,
    /// The compute units per second for the provider.
    #[arg(long = "l1.cups", id = "l1_compute_units_per_second", default_value_t = constants::PROVIDER_COMPUTE_UNITS_PER_SECOND)]
    pub compute_units_per_second: u64,
    /// The max amount of retries for the provider.
    #[arg(long = "l1.max-retries", id = "l1_max_retries", default_value_t = constants::PROVIDER_MAX_RETRIES)]
    pub max_retries: u32,
    /// The initial backoff for the provider, in milliseconds.
    #[arg(long = "l1.initial-backoff", id = "l1_initial_backoff", default_value_t = constants::PROVIDER_INITIAL_BACKOFF)]
    pub initial_backoff: u64,
    /// The timeout of a single L1 RPC call, in seconds.
    #[arg(long = "l1.rpc-timeout", id = "l1_rpc_timeout", default_value_t = constants::RPC_TIMEOUT_SECS)]
    pub rpc_timeout: u64,
}

/// The arguments for the signer.
#[derive(Debug, Default, Clone, clap::Args)]
pub struct SignerArgs {
    /// Path to the file containing the signer's private key.
    #[arg(
        long = "signer.key-file",
        value_name = "FILE_PATH",
        help = "Path to the hex-encoded private key file of the relayer account (optional 0x prefix). Mutually exclusive with --signer.private-key"
    )]
    pub key_file: Option<PathBuf>,

    /// The hex-encoded private key of the relayer account.
    #[arg(
        long = "signer.private-key",
        env = "ROLLUP_RELAYER_PRIVATE_KEY",
        value_name = "PRIVATE_KEY",
        hide_env_values = true
    )]
    pub private_key: Option<PrivateKeySigner>,
}

impl SignerArgs {
    /// Create a signer based on the configured arguments.
    pub fn signer(&self) -> eyre::Result<PrivateKeySigner> {
        let key_file_path = match (&self.key_file, &self.private_key) {
            (Some(key_file_path), _) => key_file_path,
            (None, Some(private_key)) => {
                tracing::info!(target: "rollup_relayer::node", address = %private_key.address(), "Created private key signer");
                return Ok(private_key.clone());
            }
            (None, None) => eyre::bail!("No signer key configured"),
        };
        let key_content = fs::read_to_string(key_file_path).map_err(|e| {
            eyre::eyre!("Failed to read signer key file {}: {}", key_file_path.display(), e)
        })?;
        let key_content = key_content.trim();

        let hex_str = key_content.strip_prefix("0x").unwrap_or(key_content);
        let key_bytes = hex::decode(hex_str)
            .map_err(|e| eyre::eyre!("Failed to decode hex private key: {}", e))?;
        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| eyre::eyre!("Failed to create signer from private key: {}", e))?;

        tracing::info!(target: "rollup_relayer::node", address = %signer.address(), "Created private key signer");
        Ok(signer)
    }
}

/// The arguments for the chunk proposer.
#[derive(Debug, Clone, clap::Args)]
pub struct ChunkProposerArgs {
    /// The maximum number of blocks in a chunk.
    #[arg(long = "chunk.max-block-num", default_value_t = ChunkProposerConfig::default().max_block_num_per_chunk)]
    pub max_block_num: u64,
    /// The maximum number of transactions in a chunk.
    #[arg(long = "chunk.max-tx-num", default_value_t = ChunkProposerConfig::default().max_tx_num_per_chunk)]
    pub max_tx_num: u64,
    /// The maximum transaction payload size of a chunk in bytes.
    #[arg(long = "chunk.max-payload-size", default_value_t = ChunkProposerConfig::default().max_payload_size_per_chunk)]
    pub max_payload_size: u64,
    /// The maximum prover row consumption of a chunk.
    #[arg(long = "chunk.max-row-consumption", default_value_t = ChunkProposerConfig::default().max_row_consumption_per_chunk)]
    pub max_row_consumption: u64,
    /// The age in seconds after which a chunk under the ceilings is closed.
    #[arg(long = "chunk.timeout", id = "chunk_timeout", value_name = "SECONDS", default_value_t = ChunkProposerConfig::default().chunk_timeout.as_secs())]
    pub timeout: u64,
    /// How the age of an open chunk is measured.
    #[arg(long = "chunk.timeout-mode", id = "chunk_timeout_mode", default_value_t = ProposalTimeoutMode::OldestUnit)]
    pub timeout_mode: ProposalTimeoutMode,
}

impl ChunkProposerArgs {
    const fn config(&self) -> ChunkProposerConfig {
        ChunkProposerConfig {
            max_block_num_per_chunk: self.max_block_num,
            max_tx_num_per_chunk: self.max_tx_num,
            max_payload_size_per_chunk: self.max_payload_size,
            max_row_consumption_per_chunk: self.max_row_consumption,
            chunk_timeout: Duration::from_secs(self.timeout),
            timeout_mode: self.timeout_mode,
        }
    }
}

/// The arguments for the batch proposer.
#[derive(Debug, Clone, clap::Args)]
pub struct BatchProposerArgs {
    /// The maximum number of chunks in a batch.
    #[arg(long = "batch.max-chunk-num", default_value_t = BatchProposerConfig::default().max_chunk_num_per_batch)]
    pub max_chunk_num: u64,
    /// The maximum estimated commit calldata size of a batch in bytes.
    #[arg(long = "batch.max-calldata-size", default_value_t = BatchProposerConfig::default().max_calldata_size_per_batch)]
    pub max_calldata_size: u64,
    /// The maximum estimated proving cost of a batch.
    #[arg(long = "batch.max-proof-cost", default_value_t = BatchProposerConfig::default().max_proof_cost_per_batch)]
    pub max_proof_cost: u64,
    /// The maximum estimated L1 gas of the commit transaction of a batch.
    #[arg(long = "batch.max-commit-gas", default_value_t = BatchProposerConfig::default().max_commit_gas_per_batch)]
    pub max_commit_gas: u64,
    /// The age in seconds after which a batch under the ceilings is closed.
    #[arg(long = "batch.timeout", id = "batch_timeout", value_name = "SECONDS", default_value_t = BatchProposerConfig::default().batch_timeout.as_secs())]
    pub timeout: u64,
    /// How the age of an open batch is measured.
    #[arg(long = "batch.timeout-mode", id = "batch_timeout_mode", default_value_t = ProposalTimeoutMode::OldestUnit)]
    pub timeout_mode: ProposalTimeoutMode,
}

impl BatchProposerArgs {
    const fn config(&self) -> BatchProposerConfig {
        BatchProposerConfig {
            max_chunk_num_per_batch: self.max_chunk_num,
            max_calldata_size_per_batch: self.max_calldata_size,
            max_proof_cost_per_batch: self.max_proof_cost,
            max_commit_gas_per_batch: self.max_commit_gas,
            batch_timeout: Duration::from_secs(self.timeout),
            timeout_mode: self.timeout_mode,
        }
    }
}

/// The arguments for the L1 relayer.
#[derive(Debug, Clone, clap::Args)]
pub struct RelayerArgs {
    /// The address of the rollup contract on L1.
    #[arg(long = "relayer.rollup-contract", env = "ROLLUP_RELAYER_ROLLUP_CONTRACT", value_name = "ADDRESS", default_value_t = Address::ZERO)]
    pub rollup_contract: Address,
    /// The number of L1 blocks on top of a receipt before it is final.
    #[arg(long = "relayer.confirmations", default_value_t = L1RelayerConfig::default().confirmations)]
    pub confirmations: u64,
    /// The time in seconds after the latest attempt of a transaction before it is replaced.
    #[arg(long = "relayer.tx-timeout", value_name = "SECONDS", default_value_t = L1RelayerConfig::default().tx_timeout.as_secs())]
    pub tx_timeout: u64,
    /// The maximum number of replacements of a transaction before its batch fails.
    #[arg(long = "relayer.max-replacements", default_value_t = L1RelayerConfig::default().max_replacements)]
    pub max_replacements: u64,
    /// The percentage the fees of a replacement are bumped by.
    #[arg(long = "relayer.escalate-percent", default_value_t = L1RelayerConfig::default().escalate_multiple_percent)]
    pub escalate_multiple_percent: u64,
    /// The maximum fee per gas of any attempt, in wei.
    #[arg(long = "relayer.max-gas-price", default_value_t = L1RelayerConfig::default().max_gas_price)]
    pub max_gas_price: u128,
    /// The priority fee per gas of a first attempt, in wei.
    #[arg(long = "relayer.priority-fee", default_value_t = L1RelayerConfig::default().priority_fee)]
    pub priority_fee: u128,
    /// The gas limit of a finalize transaction.
    #[arg(long = "relayer.finalize-gas-limit", default_value_t = L1RelayerConfig::default().finalize_gas_limit)]
    pub finalize_gas_limit: u64,
    /// The maximum number of new transactions submitted per scan.
    #[arg(long = "relayer.max-submissions", default_value_t = L1RelayerConfig::default().max_submissions_per_tick)]
    pub max_submissions_per_tick: u64,
}

impl RelayerArgs {
    const fn config(&self, chain_id: u64) -> L1RelayerConfig {
        L1RelayerConfig {
            rollup_contract: self.rollup_contract,
            chain_id,
            confirmations: self.confirmations,
            tx_timeout: Duration::from_secs(self.tx_timeout),
            max_replacements: self.max_replacements,
            escalate_multiple_percent: self.escalate_multiple_percent,
            max_gas_price: self.max_gas_price,
            priority_fee: self.priority_fee,
            finalize_gas_limit: self.finalize_gas_limit,
            max_submissions_per_tick: self.max_submissions_per_tick,
        }
    }
}

/// The scheduling arguments, all intervals in milliseconds.
#[derive(Debug, Clone, clap::Args)]
pub struct ScheduleArgs {
    /// The interval between two L2 watcher ticks.
    #[arg(long = "schedule.watcher-interval", default_value_t = constants::WATCHER_INTERVAL.as_millis() as u64)]
    pub watcher_interval: u64,
    /// The interval between two chunk proposer ticks.
    #[arg(long = "schedule.chunk-interval", default_value_t = constants::CHUNK_PROPOSER_INTERVAL.as_millis() as u64)]
    pub chunk_interval: u64,
    /// The interval between two batch proposer ticks.
    #[arg(long = "schedule.batch-interval", default_value_t = constants::BATCH_PROPOSER_INTERVAL.as_millis() as u64)]
    pub batch_interval: u64,
    /// The interval between two commit scans.
    #[arg(long = "schedule.commit-interval", default_value_t = constants::COMMIT_SCAN_INTERVAL.as_millis() as u64)]
    pub commit_interval: u64,
    /// The interval between two finalize scans.
    #[arg(long = "schedule.finalize-interval", default_value_t = constants::FINALIZE_SCAN_INTERVAL.as_millis() as u64)]
    pub finalize_interval: u64,
    /// The bound in seconds on how long in-flight transactions are followed on shutdown.
    #[arg(long = "schedule.shutdown-timeout", value_name = "SECONDS", default_value_t = constants::SHUTDOWN_TIMEOUT.as_secs())]
    pub shutdown_timeout: u64,
}

impl ScheduleArgs {
    const fn has_zero_interval(&self) -> bool {
        self.watcher_interval == 0 ||
            self.chunk_interval == 0 ||
            self.batch_interval == 0 ||
            self.commit_interval == 0 ||
            self.finalize_interval == 0
    }

    const fn intervals(&self) -> UnitIntervals {
        UnitIntervals {
            watcher: Duration::from_millis(self.watcher_interval),
            chunk_proposer: Duration::from_millis(self.chunk_interval),
            batch_proposer: Duration::from_millis(self.batch_interval),
            commit_scan: Duration::from_millis(self.commit_interval),
            finalize_scan: Duration::from_millis(self.finalize_interval),
        }
    }
}
