use crate::config::NodeConfig;
use crate::error::NodeError;
use cerera_chain::{Chain, ChainInfo, ChainMode};
use cerera_eventbus::{block_pipe, BlockPipeReceiver, ConsensusGate, ConsensusStatus, Registry};
use cerera_hash::Address;
use cerera_mempool::Mempool;
use cerera_miner::Miner;
use cerera_types::Tx;
use cerera_validator::Validator;
use cerera_vault::Vault;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Owns every component for the lifetime of the process and hands out
/// capability handles rather than letting components hold each other.
/// Built in the fixed order `vault -> pool -> chain -> validator -> miner
/// -> network`; the network leg is out of scope (no P2P transport).
pub struct Node {
    pub config: NodeConfig,
    pub vault: Vault,
    pub pool: Mempool,
    pub chain: Arc<Chain>,
    pub validator: Arc<Validator>,
    pub miner: Arc<Miner>,
    pub gate: Arc<ConsensusGate>,
    pub registry: Registry,
    miner_quit: Mutex<Option<mpsc::Sender<()>>>,
}

impl Node {
    pub async fn bootstrap(config: NodeConfig) -> Result<Arc<Self>, NodeError> {
        let producer = Address::from_hex(&config.producer)?;

        // vault
        let vault = Vault::new();

        // pool
        let pool = Mempool::new(config.mempool_max_size, config.min_gas_price);

        // chain
        let mode = match &config.vault_file {
            Some(path) => ChainMode::Persistent(path.clone()),
            None => ChainMode::InMemory,
        };
        let (block_tx, block_rx): (_, BlockPipeReceiver) = block_pipe();
        let chain = Arc::new(
            Chain::bootstrap(config.chain_id, config.difficulty, config.gas_limit, mode)
                .await?
                .with_broadcaster(block_tx),
        );
        drop(block_rx); // a real subscriber (logger, RPC façade) takes this; none ships here.

        // validator
        let gate = Arc::new(ConsensusGate::new());
        if config.solo {
            gate.set_status(ConsensusStatus::Local);
        }
        let validator = Arc::new(Validator::new(vault.clone(), chain.clone(), gate.clone()));

        // miner
        let miner = Arc::new(
            Miner::new(
                chain.clone(),
                pool.clone(),
                validator.clone(),
                producer,
                config.chain_id,
                config.mine_tick,
            )
            .with_batch_size(config.mine_batch_size),
        );

        // network: out of scope.

        let mut registry = Registry::new();
        registry.register(Arc::new(crate::services::ChainService::new(chain.clone())));
        registry.register(Arc::new(crate::services::MempoolService::new(pool.clone())));

        Ok(Arc::new(Node {
            config,
            vault,
            pool,
            chain,
            validator,
            miner,
            gate,
            registry,
            miner_quit: Mutex::new(None),
        }))
    }

    /// Admits a transaction into the mempool, deferring to `Mempool::queue`
    /// for the admission policy.
    pub fn submit_tx(&self, tx: Tx) -> Result<(), NodeError> {
        self.pool.queue(tx).map_err(NodeError::from)
    }

    pub async fn chain_info(&self) -> ChainInfo {
        self.chain.get_info().await
    }

    /// Flips the consensus gate so proposed blocks are no longer dropped.
    /// A production multi-node deployment would drive this from the
    /// networking layer instead (out of scope here).
    pub fn start_consensus(&self) {
        self.gate.set_status(ConsensusStatus::Local);
    }

    /// Spawns the miner's tick loop as a background task. Idempotent:
    /// calling it again while a loop is already running replaces it after
    /// stopping the old one.
    pub async fn spawn_miner(self: &Arc<Self>) {
        self.stop_miner().await;
        let (quit_tx, quit_rx) = mpsc::channel(1);
        *self.miner_quit.lock().await = Some(quit_tx);
        let miner = self.miner.clone();
        tokio::spawn(async move {
            miner.run(quit_rx).await;
        });
    }

    /// Cooperatively stops a running miner loop, if one is running.
    pub async fn stop_miner(&self) {
        if let Some(quit) = self.miner_quit.lock().await.take() {
            let _ = quit.send(()).await;
        }
    }

    /// Pauses mining without tearing down the loop: the next tick observes
    /// `Chain::is_idle` and skips its search.
    pub fn idle(&self) {
        self.chain.idle();
    }

    pub fn resume(&self) {
        self.chain.resume();
    }
}
