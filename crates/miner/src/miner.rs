use crate::error::MinerError;
use crate::search::{search, SearchOutcome};
use crate::template::build_template;
use cerera_chain::Chain;
use cerera_hash::{Address, Hash};
use cerera_mempool::Mempool;
use cerera_types::Block;
use cerera_validator::Validator;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Mirrors the tick state machine: `Alloc -> Prepared -> Run -> {Found ->
/// Refresh -> Run, Refresh -> Run, Stop}`. Exposed so tests and logs can
/// observe which phase a tick is in; the loop itself drives the
/// transitions rather than anything external.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinerState {
    Alloc,
    Prepared,
    Run,
    Found,
    Refresh,
    Stopped,
}

#[derive(Debug, Default)]
pub struct MinerMetrics {
    pub ticks: AtomicU64,
    pub attempts: AtomicU64,
    pub blocks_found: AtomicU64,
    pub budgets_exhausted: AtomicU64,
    pub difficulty_zero_rejections: AtomicU64,
}

/// How many nonces a single tick's PoW search will try before giving up and
/// waiting for the next tick.
const DEFAULT_BATCH_SIZE: u64 = 200_000;

/// Tracks where the search left off so a budget-exhausted batch resumes
/// from `next_nonce` rather than restarting at the template's initial
/// value, but only as long as the head it was searching against hasn't
/// moved; a head change discards in-flight progress.
struct SearchCursor {
    head_hash: Hash,
    next_nonce: u64,
}

/// Template builder, PoW nonce search and block proposal (component C6).
/// One mining worker per node; communication in is by channel only.
pub struct Miner {
    chain: Arc<Chain>,
    pool: Mempool,
    validator: Arc<Validator>,
    producer: Address,
    chain_id: u64,
    tick_interval: Duration,
    batch_size: u64,
    cursor: Mutex<Option<SearchCursor>>,
    metrics: Arc<MinerMetrics>,
}

impl Miner {
    pub fn new(
        chain: Arc<Chain>,
        pool: Mempool,
        validator: Arc<Validator>,
        producer: Address,
        chain_id: u64,
        tick_interval: Duration,
    ) -> Self {
        Miner {
            chain,
            pool,
            validator,
            producer,
            chain_id,
            tick_interval,
            batch_size: DEFAULT_BATCH_SIZE,
            cursor: Mutex::new(None),
            metrics: Arc::new(MinerMetrics::default()),
        }
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn metrics(&self) -> Arc<MinerMetrics> {
        self.metrics.clone()
    }

    /// Runs the periodic mining loop until `quit` fires. Each tick always
    /// attempts a mine, even if consensus has not started: the decision to
    /// accept or drop the resulting block belongs to the validator, not the
    /// miner. Mining work itself is gated earlier, on `Chain::is_idle`,
    /// rather than on the consensus gate.
    pub async fn run(self: Arc<Self>, mut quit: mpsc::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = quit.recv() => {
                    tracing::info!("miner received stop signal");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    /// Runs exactly one tick of the state machine; public so tests and a
    /// manual "mine one block" RPC path can drive it without waiting on the
    /// ticker.
    pub async fn tick(&self) {
        self.metrics.ticks.fetch_add(1, Ordering::Relaxed);

        if self.chain.is_idle() {
            tracing::debug!("chain is idle; skipping this tick's mining attempt");
            return;
        }

        // Alloc
        let head = self.chain.get_latest().await;
        let pending = self.pool.get_pending();

        // Prepared
        let template = build_template(&head, self.producer, self.chain_id, pending);

        let start_nonce = {
            let mut cursor = self.cursor.lock().unwrap();
            match cursor.as_ref() {
                Some(c) if c.head_hash == head.hash => c.next_nonce,
                _ => template.header.nonce,
            }
        };

        // Run
        let outcome = search(&template, start_nonce, self.batch_size);
        self.metrics
            .attempts
            .fetch_add(self.batch_size, Ordering::Relaxed);

        match outcome {
            Err(MinerError::DifficultyZero) => {
                self.metrics
                    .difficulty_zero_rejections
                    .fetch_add(1, Ordering::Relaxed);
                tracing::warn!("template rejected: difficulty is zero");
            }
            Ok(SearchOutcome::Exhausted { next_nonce }) => {
                self.metrics
                    .budgets_exhausted
                    .fetch_add(1, Ordering::Relaxed);
                *self.cursor.lock().unwrap() = Some(SearchCursor {
                    head_hash: head.hash,
                    next_nonce,
                });
                tracing::debug!(next_nonce, "search budget exhausted; resuming next tick");
                // Refresh: a fresh template (possibly against a new head)
                // is built again on the next tick.
            }
            Ok(SearchOutcome::Found { nonce, hash }) => {
                // Found. `timestamp_ms` was already fixed at template-build
                // time, set once when the template is built and not here,
                // so the winning hash stays consistent with the header it
                // was computed over.
                let header = template.header.with_nonce(nonce);
                let mut block = Block {
                    header,
                    transactions: template.transactions,
                    hash,
                };
                block.header.size = block.encode().len() as u64;

                self.metrics.blocks_found.fetch_add(1, Ordering::Relaxed);
                *self.cursor.lock().unwrap() = None;

                let included: Vec<Hash> = block
                    .transactions
                    .iter()
                    .filter(|tx| !matches!(tx.kind, cerera_types::TxKind::Coinbase))
                    .map(|tx| tx.hash())
                    .collect();

                match self.validator.propose_block(block).await {
                    Ok(()) => {
                        for hash in &included {
                            let _ = self.pool.remove(hash);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "validator rejected proposed block; retrying next tick");
                    }
                }
                // Refresh happens implicitly: the next tick re-reads the
                // (now possibly advanced) head.
            }
        }
    }
}
