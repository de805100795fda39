//! The L1 relayer commits the proposed batches to the rollup contract, finalizes them once their
//! proof is available, and follows every transaction until it is confirmed or fails.
//!
//! Every transaction is persisted along with the batch status transition before it is broadcast,
//! so a restarted relayer resumes following the in-flight transactions from the database.

pub mod abi;

mod config;
pub use config::L1RelayerConfig;

mod error;
pub use error::RelayerError;

pub mod gas;

mod metrics;
pub use metrics::L1RelayerMetrics;

mod signer;
pub use signer::{RollupTxSigner, SharedTxSigner};

use alloy_consensus::{Transaction, TxEnvelope};
use alloy_eips::eip2718::Decodable2718;
use alloy_primitives::{Address, Bytes};
use error::RelayerResult;
use rollup_relayer_primitives::{
    unix_timestamp, Batch, BatchStatus, RollupTransaction, RollupTxKind, RollupTxStatus,
    TransactionAttempt,
};
use rollup_relayer_providers::{L1Provider, SendErrorKind, TransactionReceiptInfo};
use scroll_db::{Database, DatabaseOperations};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// The interval between two confirmation scans while closing.
const CLOSE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The batch statuses of a transaction kind: before submission, in flight, and once confirmed.
const fn statuses(kind: RollupTxKind) -> (BatchStatus, BatchStatus, BatchStatus) {
    match kind {
        RollupTxKind::Commit => {
            (BatchStatus::Unassigned, BatchStatus::PendingCommit, BatchStatus::Committed)
        }
        RollupTxKind::Finalize => {
            (BatchStatus::Committed, BatchStatus::PendingFinalize, BatchStatus::Finalized)
        }
    }
}

/// The outcome of a confirmation check of a pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    /// The transaction is still in flight.
    Pending,
    /// The transaction was replaced with a higher fee.
    Replaced,
    /// The transaction is confirmed.
    Confirmed,
    /// The transaction failed permanently.
    Failed,
    /// The transaction was abandoned and is being cancelled.
    Cancelled,
}

/// Returns the lowest nonce of the `pending` transactions being cancelled. No later transaction
/// of the account can be included before that nonce is filled.
fn lowest_cancelled_nonce(pending: &[RollupTransaction]) -> Option<u64> {
    pending.iter().filter(|tx| tx.status == RollupTxStatus::Cancelling).map(|tx| tx.nonce).min()
}

/// Submits the commit and finalize transactions of the proposed batches to L1.
#[derive(Debug)]
pub struct L1Relayer<P> {
    /// The L1 provider.
    provider: P,
    /// The database.
    database: Arc<Database>,
    /// The signer of the relayer account.
    signer: RollupTxSigner,
    /// The relayer configuration.
    config: L1RelayerConfig,
    /// The relayer metrics.
    metrics: L1RelayerMetrics,
    /// Set once the relayer is closing, after which no transaction is submitted or replaced.
    closing: AtomicBool,
}

impl<P> L1Relayer<P>
where
    P: L1Provider,
{
    /// Returns a new [`L1Relayer`] sending transactions signed by `signer`.
    pub fn new(
        provider: P,
        database: Arc<Database>,
        signer: SharedTxSigner,
        config: L1RelayerConfig,
    ) -> Self {
        let signer = RollupTxSigner::new(signer, config.chain_id, config.rollup_contract);
        Self {
            provider,
            database,
            signer,
            config,
            metrics: L1RelayerMetrics::default(),
            closing: AtomicBool::new(false),
        }
    }

    /// Returns the address of the relayer account.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Returns true once [`L1Relayer::close`] was called.
    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::Relaxed)
    }

    /// Synchronizes the persisted nonce counter of the relayer account with the pending nonce of
    /// the account on L1, returning the next nonce.
    ///
    /// Must be called once before any submission.
    pub async fn initialize(&self) -> RelayerResult<u64> {
        let address = self.address();
        let chain_nonce = self.provider.transaction_count(address).await?;
        let next = self.database.sync_next_nonce(address, chain_nonce).await?;
        tracing::info!(target: "scroll::relayer", %address, chain_nonce, next, "initialized relayer account");
        Ok(next)
    }

    /// Follows the in-flight commit transactions and commits the proposed batches.
    pub async fn process_pending_batches(&self) -> RelayerResult<()> {
        self.process_pending_batches_at(unix_timestamp()).await
    }

    /// Follows the in-flight commit transactions and commits the proposed batches, measuring
    /// timeouts against `now`.
    #[tracing::instrument(target = "scroll::relayer", skip(self))]
    pub async fn process_pending_batches_at(&self, now: u64) -> RelayerResult<()> {
        let start = Instant::now();
        self.resolve_pending(RollupTxKind::Commit, now).await?;

        if !self.is_closing() && !self.holds_submissions().await? {
            let limit = self.config.max_submissions_per_tick;
            let batches =
                self.database.get_batches_by_status(BatchStatus::Unassigned, limit).await?;
            for batch in batches {
                if self.parent_failed(&batch).await? {
                    tracing::warn!(target: "scroll::relayer", batch_index = batch.index, "parent batch failed, holding commits");
                    break;
                }
                let input = self.commit_calldata(&batch).await?;
                self.submit(&batch, RollupTxKind::Commit, input, now).await?;
            }
        }

        self.update_oldest_pending_batch_age(now).await?;
        self.metrics.commit_scan_duration.record(start.elapsed().as_secs_f64());
        Ok(())
    }

    /// Follows the in-flight finalize transactions and finalizes the committed batches whose
    /// proof is available.
    pub async fn process_committed_batches(&self) -> RelayerResult<()> {
        self.process_committed_batches_at(unix_timestamp()).await
    }

    /// Follows the in-flight finalize transactions and finalizes the committed batches whose
    /// proof is available, measuring timeouts against `now`.
    ///
    /// Batches are finalized in index order, so the scan stops at the first batch without a
    /// proof.
    #[tracing::instrument(target = "scroll::relayer", skip(self))]
    pub async fn process_committed_batches_at(&self, now: u64) -> RelayerResult<()> {
        let start = Instant::now();
        self.resolve_pending(RollupTxKind::Finalize, now).await?;

        if !self.is_closing() && !self.holds_submissions().await? {
            let limit = self.config.max_submissions_per_tick;
            let batches =
                self.database.get_batches_by_status(BatchStatus::Committed, limit).await?;
            for batch in batches {
                if !self.parent_finalizing(&batch).await? {
                    tracing::trace!(target: "scroll::relayer", batch_index = batch.index, "parent batch not finalizing yet");
                    break;
                }
                let Some(proof) = batch.proof.clone() else {
                    tracing::debug!(target: "scroll::relayer", batch_index = batch.index, "awaiting proof");
                    break;
                };
                let input = abi::finalize_batch_calldata(&batch, proof);
                self.submit(&batch, RollupTxKind::Finalize, input, now).await?;
            }
        }

        self.update_oldest_pending_batch_age(now).await?;
        self.metrics.finalize_scan_duration.record(start.elapsed().as_secs_f64());
        Ok(())
    }

    /// Stops submitting and replacing transactions, and follows the in-flight ones until they
    /// are all resolved or `timeout` elapses.
    #[tracing::instrument(target = "scroll::relayer", skip(self))]
    pub async fn close(&self, timeout: Duration) -> RelayerResult<()> {
        self.closing.store(true, Ordering::Relaxed);
        let deadline = Instant::now() + timeout;

        loop {
            let pending = self.database.get_pending_rollup_transactions().await?;
            if pending.is_empty() {
                tracing::info!(target: "scroll::relayer", "no transaction in flight, relayer closed");
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(target: "scroll::relayer", in_flight = pending.len(), "shutdown timeout elapsed with transactions in flight");
                return Ok(());
            }

            match self.provider.block_number().await {
                Ok(l1_head) => {
                    let gap = lowest_cancelled_nonce(&pending);
                    for tx in pending {
                        if let Err(err) = self.resolve(tx, l1_head, unix_timestamp(), gap).await {
                            tracing::warn!(target: "scroll::relayer", ?err, "failed to resolve transaction while closing");
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(target: "scroll::relayer", ?err, "failed to fetch l1 head while closing")
                }
            }

            tokio::time::sleep(CLOSE_POLL_INTERVAL.min(deadline - now)).await;
        }
    }

    /// Resolves the in-flight transactions of `kind`, in nonce order.
    async fn resolve_pending(&self, kind: RollupTxKind, now: u64) -> RelayerResult<()> {
        let pending = self.database.get_pending_rollup_transactions().await?;
        if !pending.iter().any(|tx| tx.kind == kind) {
            return Ok(());
        }

        let l1_head = self.provider.block_number().await?;
        let mut gap = lowest_cancelled_nonce(&pending);
        let mut resolutions = Vec::new();
        for tx in pending.into_iter().filter(|tx| tx.kind == kind) {
            let nonce = tx.nonce;
            let resolution = self.resolve(tx, l1_head, now, gap).await?;
            if resolution == Resolution::Cancelled {
                gap = Some(gap.map_or(nonce, |gap| gap.min(nonce)));
            }
            resolutions.push(resolution);
        }

        let count = |r| resolutions.iter().filter(|&&x| x == r).count();
        tracing::debug!(
            target: "scroll::relayer",
            %kind,
            l1_head,
            pending = count(Resolution::Pending),
            replaced = count(Resolution::Replaced),
            confirmed = count(Resolution::Confirmed),
            failed = count(Resolution::Failed),
            cancelled = count(Resolution::Cancelled),
            "resolved in-flight transactions"
        );
        Ok(())
    }

    /// Returns the receipt of the most recent attempt of `tx` included on L1, along with the
    /// attempt.
    async fn find_receipt<'a>(
        &self,
        tx: &'a RollupTransaction,
    ) -> RelayerResult<Option<(&'a TransactionAttempt, TransactionReceiptInfo)>> {
        for attempt in tx.attempts.iter().rev() {
            if let Some(receipt) = self.provider.transaction_receipt(attempt.hash).await? {
                return Ok(Some((attempt, receipt)));
            }
        }
        Ok(None)
    }

    /// Confirms, fails, replaces or cancels the pending `tx` given the current `l1_head`.
    ///
    /// A receipt of any of the attempts resolves the transaction once it is `confirmations`
    /// blocks deep. Without a receipt, the transaction is replaced after the timeout, and is
    /// cancelled once it has been replaced the maximum number of times. A transaction queued
    /// behind the `gap` nonce of a cancelled one is left as is until the nonce is filled.
    async fn resolve(
        &self,
        tx: RollupTransaction,
        l1_head: u64,
        now: u64,
        gap: Option<u64>,
    ) -> RelayerResult<Resolution> {
        if tx.status == RollupTxStatus::Cancelling {
            return self.resolve_cancelling(tx, l1_head, now).await;
        }

        let (batch_index, kind) = (tx.batch_index, tx.kind);
        let Some(latest) = tx.latest_attempt() else {
            return Err(RelayerError::MissingAttempt { batch_index, kind });
        };

        match self.find_receipt(&tx).await?.map(|(_, receipt)| receipt) {
            Some(TransactionReceiptInfo { transaction_hash, block_number, success })
                if block_number + self.config.confirmations <= l1_head =>
            {
                if success {
                    self.confirm(&tx, now).await?;
                    tracing::info!(target: "scroll::relayer", batch_index, %kind, tx_hash = ?transaction_hash, block_number, "transaction confirmed");
                    Ok(Resolution::Confirmed)
                } else {
                    self.fail(&tx).await?;
                    tracing::error!(target: "scroll::relayer", batch_index, %kind, tx_hash = ?transaction_hash, block_number, "transaction reverted");
                    Ok(Resolution::Failed)
                }
            }
            Some(TransactionReceiptInfo { transaction_hash, block_number, .. }) => {
                tracing::trace!(target: "scroll::relayer", batch_index, %kind, tx_hash = ?transaction_hash, block_number, l1_head, "awaiting confirmations");
                Ok(Resolution::Pending)
            }
            None if self.is_closing() => Ok(Resolution::Pending),
            None if now.saturating_sub(latest.submitted_at) < self.config.tx_timeout.as_secs() => {
                Ok(Resolution::Pending)
            }
            None if gap.is_some_and(|gap| gap < tx.nonce) => {
                tracing::debug!(target: "scroll::relayer", batch_index, %kind, nonce = tx.nonce, ?gap, "transaction queued behind a cancelled nonce");
                Ok(Resolution::Pending)
            }
            None if tx.replacements() >= self.config.max_replacements => {
                tracing::error!(target: "scroll::relayer", batch_index, %kind, replacements = tx.replacements(), "transaction not included after the maximum replacements");
                self.cancel(&tx, latest, now).await
            }
            None => self.replace(&tx, latest, now).await,
        }
    }

    /// Follows the cancellation of `tx` until its nonce is filled.
    ///
    /// The batch fails once a cancellation or a reverted attempt is confirmed. An earlier attempt
    /// confirmed successfully still moves the batch forward. Without a receipt, the cancellation
    /// is replaced with higher fees after the timeout, or broadcast again once the fees are
    /// capped.
    async fn resolve_cancelling(
        &self,
        tx: RollupTransaction,
        l1_head: u64,
        now: u64,
    ) -> RelayerResult<Resolution> {
        let (batch_index, kind) = (tx.batch_index, tx.kind);
        let Some(latest) = tx.latest_attempt() else {
            return Err(RelayerError::MissingAttempt { batch_index, kind });
        };

        match self.find_receipt(&tx).await? {
            Some((attempt, receipt))
                if receipt.block_number + self.config.confirmations <= l1_head =>
            {
                if receipt.success && !self.is_cancellation(&tx, attempt)? {
                    self.confirm(&tx, now).await?;
                    tracing::warn!(target: "scroll::relayer", batch_index, %kind, tx_hash = ?attempt.hash, "cancelled transaction confirmed");
                    Ok(Resolution::Confirmed)
                } else {
                    self.fail(&tx).await?;
                    tracing::info!(target: "scroll::relayer", batch_index, %kind, nonce = tx.nonce, tx_hash = ?attempt.hash, "cancelled nonce filled");
                    Ok(Resolution::Failed)
                }
            }
            Some(_) => Ok(Resolution::Pending),
            None if self.is_closing() => Ok(Resolution::Pending),
            None if now.saturating_sub(latest.submitted_at) < self.config.tx_timeout.as_secs() => {
                Ok(Resolution::Pending)
            }
            None => match self.sign_cancellation(&tx, latest, now).await? {
                Some(attempt) => {
                    self.database.append_transaction_attempt(batch_index, kind, &attempt).await?;
                    self.metrics.transactions_replaced.increment(1);
                    tracing::info!(target: "scroll::relayer", batch_index, %kind, nonce = tx.nonce, tx_hash = ?attempt.hash, "replaced cancellation");
                    self.broadcast(batch_index, kind, &attempt).await;
                    Ok(Resolution::Replaced)
                }
                None => {
                    self.broadcast(batch_index, kind, latest).await;
                    Ok(Resolution::Pending)
                }
            },
        }
    }

    /// Abandons `tx` after its `latest` attempt, keeping its batch pending until the nonce is
    /// filled by a cancellation. No cancellation is sent if the maximum gas price leaves no room
    /// for a replacement, as the previous attempts may still fill the nonce.
    async fn cancel(
        &self,
        tx: &RollupTransaction,
        latest: &TransactionAttempt,
        now: u64,
    ) -> RelayerResult<Resolution> {
        let attempt = self.sign_cancellation(tx, latest, now).await?;

        let db_tx = self.database.tx_mut().await?;
        db_tx
            .set_rollup_transaction_status(tx.batch_index, tx.kind, RollupTxStatus::Cancelling)
            .await?;
        if let Some(attempt) = &attempt {
            db_tx.append_transaction_attempt(tx.batch_index, tx.kind, attempt).await?;
        }
        db_tx.commit().await?;

        self.metrics.transactions_cancelled.increment(1);
        tracing::warn!(
            target: "scroll::relayer",
            batch_index = tx.batch_index,
            kind = %tx.kind,
            nonce = tx.nonce,
            tx_hash = ?attempt.as_ref().map(|attempt| attempt.hash),
            "cancelling transaction"
        );
        if let Some(attempt) = &attempt {
            self.broadcast(tx.batch_index, tx.kind, attempt).await;
        }
        Ok(Resolution::Cancelled)
    }

    /// Signs a cancellation replacing the `latest` attempt of `tx`. Returns [`None`] if the
    /// maximum gas price leaves no room for a higher fee.
    async fn sign_cancellation(
        &self,
        tx: &RollupTransaction,
        latest: &TransactionAttempt,
        now: u64,
    ) -> RelayerResult<Option<TransactionAttempt>> {
        let gas_price = self.provider.gas_price().await?;
        let Some(gas) = gas::cancellation_gas(&latest.gas, gas_price, &self.config) else {
            return Ok(None);
        };
        let (hash, raw) = self.signer.sign_cancellation(tx.nonce, gas).await?;
        Ok(Some(TransactionAttempt { hash, gas, raw, submitted_at: now }))
    }

    /// Returns true while a transaction is being cancelled. Every later nonce is stuck until
    /// the cancelled one is filled, so no transaction is submitted in the meantime.
    async fn holds_submissions(&self) -> RelayerResult<bool> {
        let pending = self.database.get_pending_rollup_transactions().await?;
        let Some(nonce) = lowest_cancelled_nonce(&pending) else { return Ok(false) };
        tracing::warn!(target: "scroll::relayer", nonce, "awaiting a cancelled nonce, holding submissions");
        Ok(true)
    }

    /// Submits the transaction of `kind` with `input` for `batch`.
    ///
    /// The nonce allocation, the transaction and the batch status transition are persisted
    /// together before the broadcast.
    async fn submit(
        &self,
        batch: &Batch,
        kind: RollupTxKind,
        input: Bytes,
        now: u64,
    ) -> RelayerResult<()> {
        let (from, to, _) = statuses(kind);
        let gas_limit = match kind {
            RollupTxKind::Commit => gas::commit_gas_limit(batch.cost.commit_gas),
            RollupTxKind::Finalize => self.config.finalize_gas_limit,
        };
        let gas_price = self.provider.gas_price().await?;
        let gas = gas::initial_gas(gas_price, gas_limit, &self.config);
        let sender = self.address();

        let db_tx = self.database.tx_mut().await?;
        let nonce = db_tx.allocate_nonce(sender).await?;
        let (hash, raw) = self.signer.sign(nonce, gas, input).await?;
        let attempt = TransactionAttempt { hash, gas, raw, submitted_at: now };
        let tx = RollupTransaction {
            batch_index: batch.index,
            kind,
            sender,
            nonce,
            status: RollupTxStatus::Pending,
            attempts: vec![attempt.clone()],
        };
        db_tx.insert_rollup_transaction(&tx).await?;
        db_tx.update_batch_status(batch.index, from, to, now).await?;
        db_tx.commit().await?;

        self.metrics.transactions_submitted.increment(1);
        tracing::info!(target: "scroll::relayer", batch_index = batch.index, %kind, nonce, tx_hash = ?hash, max_fee_per_gas = gas.max_fee_per_gas, "submitted transaction");
        self.broadcast(batch.index, kind, &attempt).await;
        Ok(())
    }

    /// Replaces the `latest` attempt of `tx` with the same nonce and higher fees. Cancels the
    /// transaction if the maximum gas price leaves no room for a higher fee.
    async fn replace(
        &self,
        tx: &RollupTransaction,
        latest: &TransactionAttempt,
        now: u64,
    ) -> RelayerResult<Resolution> {
        let gas_price = self.provider.gas_price().await?;
        let Some(gas) = gas::bump_gas(&latest.gas, gas_price, &self.config) else {
            tracing::error!(target: "scroll::relayer", batch_index = tx.batch_index, kind = %tx.kind, max_fee_per_gas = latest.gas.max_fee_per_gas, "maximum gas price reached");
            return self.cancel(tx, latest, now).await;
        };

        let input = self.attempt_input(tx, latest)?;
        let (hash, raw) = self.signer.sign(tx.nonce, gas, input).await?;
        let attempt = TransactionAttempt { hash, gas, raw, submitted_at: now };
        self.database.append_transaction_attempt(tx.batch_index, tx.kind, &attempt).await?;

        self.metrics.transactions_replaced.increment(1);
        tracing::info!(
            target: "scroll::relayer",
            batch_index = tx.batch_index,
            kind = %tx.kind,
            nonce = tx.nonce,
            replaced = ?latest.hash,
            tx_hash = ?hash,
            max_fee_per_gas = gas.max_fee_per_gas,
            "replaced transaction"
        );
        self.broadcast(tx.batch_index, tx.kind, &attempt).await;
        Ok(Resolution::Replaced)
    }

    /// Broadcasts `attempt`. A rejected broadcast is only logged: the attempt is persisted and
    /// will be replaced once it times out.
    async fn broadcast(
        &self,
        batch_index: u64,
        kind: RollupTxKind,
        attempt: &TransactionAttempt,
    ) {
        match self.provider.send_raw_transaction(&attempt.raw).await {
            Ok(_) => {}
            Err(err) => match err.send_error_kind() {
                SendErrorKind::AlreadyKnown | SendErrorKind::NonceTooLow => {
                    tracing::debug!(target: "scroll::relayer", batch_index, %kind, tx_hash = ?attempt.hash, ?err, "transaction already broadcast");
                }
                _ => {
                    self.metrics.broadcast_errors.increment(1);
                    tracing::warn!(target: "scroll::relayer", batch_index, %kind, tx_hash = ?attempt.hash, ?err, "failed to broadcast transaction");
                }
            },
        }
    }

    /// Marks `tx` as confirmed and moves its batch forward.
    async fn confirm(&self, tx: &RollupTransaction, now: u64) -> RelayerResult<()> {
        let (_, pending, confirmed) = statuses(tx.kind);
        let db_tx = self.database.tx_mut().await?;
        db_tx
            .set_rollup_transaction_status(tx.batch_index, tx.kind, RollupTxStatus::Confirmed)
            .await?;
        db_tx.update_batch_status(tx.batch_index, pending, confirmed, now).await?;
        db_tx.commit().await?;
        self.metrics.transactions_confirmed.increment(1);
        Ok(())
    }

    /// Marks `tx` and its batch as failed.
    async fn fail(&self, tx: &RollupTransaction) -> RelayerResult<()> {
        let (_, pending, _) = statuses(tx.kind);
        let db_tx = self.database.tx_mut().await?;
        db_tx
            .set_rollup_transaction_status(tx.batch_index, tx.kind, RollupTxStatus::Failed)
            .await?;
        db_tx
            .update_batch_status(tx.batch_index, pending, BatchStatus::Failed, unix_timestamp())
            .await?;
        db_tx.commit().await?;
        self.metrics.transactions_failed.increment(1);
        Ok(())
    }

    /// Decodes the persisted `attempt` of `tx`.
    fn decode_attempt(
        &self,
        tx: &RollupTransaction,
        attempt: &TransactionAttempt,
    ) -> RelayerResult<TxEnvelope> {
        TxEnvelope::decode_2718(&mut attempt.raw.as_ref()).map_err(|error| {
            RelayerError::InvalidAttempt { batch_index: tx.batch_index, kind: tx.kind, error }
        })
    }

    /// Returns the calldata of the persisted `attempt` of `tx`.
    fn attempt_input(
        &self,
        tx: &RollupTransaction,
        attempt: &TransactionAttempt,
    ) -> RelayerResult<Bytes> {
        Ok(self.decode_attempt(tx, attempt)?.input().clone())
    }

    /// Returns true if the persisted `attempt` of `tx` is a cancellation, sent back to the
    /// relayer account.
    fn is_cancellation(
        &self,
        tx: &RollupTransaction,
        attempt: &TransactionAttempt,
    ) -> RelayerResult<bool> {
        Ok(self.decode_attempt(tx, attempt)?.to() == Some(tx.sender))
    }

    /// Returns the calldata committing `batch`.
    async fn commit_calldata(&self, batch: &Batch) -> RelayerResult<Bytes> {
        let parent_header = match batch.index.checked_sub(1) {
            Some(parent) => match self.database.get_batch(parent).await? {
                Some(parent) => abi::encode_batch_header(&parent),
                None => Bytes::new(),
            },
            None => Bytes::new(),
        };

        let chunks = self.database.get_chunks(batch.start_chunk_index, batch.num_chunks()).await?;
        let mut encoded = Vec::with_capacity(chunks.len());
        for (offset, chunk) in chunks.iter().enumerate() {
            let expected = batch.start_chunk_index + offset as u64;
            if chunk.index != expected || chunk.index > batch.end_chunk_index {
                return Err(RelayerError::MissingChunk {
                    batch_index: batch.index,
                    chunk_index: expected,
                });
            }
            let blocks =
                self.database.get_l2_blocks(chunk.start_block_number, chunk.num_blocks()).await?;
            if blocks.len() as u64 != chunk.num_blocks() {
                return Err(RelayerError::MissingBlock {
                    chunk_index: chunk.index,
                    number: chunk.start_block_number + blocks.len() as u64,
                });
            }
            encoded.push(abi::encode_chunk(chunk.index, &blocks)?);
        }
        if encoded.len() as u64 != batch.num_chunks() {
            return Err(RelayerError::MissingChunk {
                batch_index: batch.index,
                chunk_index: batch.start_chunk_index + encoded.len() as u64,
            });
        }

        Ok(abi::commit_batch_calldata(parent_header, encoded))
    }

    /// Returns true if the batch before `batch` failed.
    async fn parent_failed(&self, batch: &Batch) -> RelayerResult<bool> {
        let Some(parent) = batch.index.checked_sub(1) else { return Ok(false) };
        Ok(self
            .database
            .get_batch(parent)
            .await?
            .is_some_and(|parent| parent.status == BatchStatus::Failed))
    }

    /// Returns true if the batch before `batch` is being or was finalized.
    async fn parent_finalizing(&self, batch: &Batch) -> RelayerResult<bool> {
        let Some(parent) = batch.index.checked_sub(1) else { return Ok(true) };
        Ok(self.database.get_batch(parent).await?.is_none_or(|parent| {
            matches!(parent.status, BatchStatus::PendingFinalize | BatchStatus::Finalized)
        }))
    }

    /// Updates the age of the oldest batch that is neither finalized nor failed.
    async fn update_oldest_pending_batch_age(&self, now: u64) -> RelayerResult<()> {
        let age = self
            .database
            .get_oldest_unfinished_batch()
            .await?
            .map_or(0, |batch| now.saturating_sub(batch.created_at));
        self.metrics.oldest_pending_batch_age.set(age as f64);
        Ok(())
    }
}
