use crate::error::ChainError;
use crate::persistence::{append_block, read_vault_file};
use cerera_eventbus::BlockPipeSender;
use cerera_hash::{Address, Hash};
use cerera_types::{Block, BlockHeader, HEADER_VERSION};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub enum ChainMode {
    InMemory,
    Persistent(PathBuf),
}

#[derive(Debug, Clone)]
pub struct ChainInfo {
    pub chain_id: u64,
    pub height: u64,
    pub total_blocks: u64,
    pub head_hash: Hash,
    pub chain_work: u64,
}

struct ChainState {
    blocks: Vec<Block>,
    by_hash: HashMap<Hash, usize>,
    confirmations: Vec<u64>,
}

impl ChainState {
    fn push(&mut self, block: Block) {
        let idx = self.blocks.len();
        self.by_hash.insert(block.hash, idx);
        for c in self.confirmations.iter_mut() {
            *c += 1;
        }
        self.confirmations.push(0);
        self.blocks.push(block);
    }
}

fn genesis_block(chain_id: u64, difficulty: u64, gas_limit: u64) -> Block {
    let header = BlockHeader {
        index: 0,
        height: 0,
        prev_hash: Hash::zero(),
        timestamp_ms: 0,
        difficulty,
        gas_limit,
        gas_used: 0,
        chain_id,
        producer: Address::zero(),
        nonce: 0,
        root: Block::tx_root(&[]),
        size: 0,
        extra: b"cerera-genesis".to_vec(),
        v: HEADER_VERSION,
    };
    let mut block = Block::seal(header, Vec::new());
    block.header.size = block.encode().len() as u64;
    block
}

/// Walks `blocks` from the front, keeping the longest prefix whose linkage
/// is internally consistent: validate the prefix, and use the longest
/// valid prefix as the chain's initial state.
fn longest_valid_prefix(blocks: Vec<Block>) -> Vec<Block> {
    let mut out = Vec::new();
    for block in blocks {
        match out.last() {
            None => {
                if block.header.index == 0 {
                    out.push(block);
                } else {
                    break;
                }
            }
            Some(prev) => {
                let prev: &Block = prev;
                if block.header.prev_hash == prev.hash
                    && block.header.index == prev.header.index + 1
                    && block.header.height == prev.header.height + 1
                {
                    out.push(block);
                } else {
                    break;
                }
            }
        }
    }
    out
}

/// Genesis bootstrap, block append, head tracking and vault-file
/// persistence (component C7).
pub struct Chain {
    state: Mutex<ChainState>,
    mode: ChainMode,
    chain_id: u64,
    mining_paused: AtomicBool,
    broadcaster: Option<BlockPipeSender>,
}

impl Chain {
    pub async fn bootstrap(
        chain_id: u64,
        difficulty: u64,
        gas_limit: u64,
        mode: ChainMode,
    ) -> Result<Self, ChainError> {
        let blocks = match &mode {
            ChainMode::InMemory => vec![genesis_block(chain_id, difficulty, gas_limit)],
            ChainMode::Persistent(path) => {
                let loaded = read_vault_file(path)?;
                if loaded.is_empty() {
                    let genesis = genesis_block(chain_id, difficulty, gas_limit);
                    append_block(path, &genesis)?;
                    vec![genesis]
                } else {
                    let prefix = longest_valid_prefix(loaded);
                    if prefix.is_empty() {
                        let genesis = genesis_block(chain_id, difficulty, gas_limit);
                        append_block(path, &genesis)?;
                        vec![genesis]
                    } else {
                        prefix
                    }
                }
            }
        };

        let mut state = ChainState {
            blocks: Vec::new(),
            by_hash: HashMap::new(),
            confirmations: Vec::new(),
        };
        for block in blocks {
            state.push(block);
        }

        Ok(Chain {
            state: Mutex::new(state),
            mode,
            chain_id,
            mining_paused: AtomicBool::new(false),
            broadcaster: None,
        })
    }

    pub fn with_broadcaster(mut self, sender: BlockPipeSender) -> Self {
        self.broadcaster = Some(sender);
        self
    }

    pub fn service_name(&self) -> &'static str {
        "chain"
    }

    pub async fn get_info(&self) -> ChainInfo {
        let guard = self.state.lock().await;
        let head = guard.blocks.last().expect("genesis always present");
        ChainInfo {
            chain_id: self.chain_id,
            height: head.header.height,
            total_blocks: guard.blocks.len() as u64,
            head_hash: head.hash,
            chain_work: guard.blocks.iter().map(|b| b.header.size).sum(),
        }
    }

    pub async fn get_latest(&self) -> Block {
        self.state.lock().await.blocks.last().cloned().expect("genesis always present")
    }

    pub async fn get_block_by_index(&self, index: u64) -> Result<Block, ChainError> {
        let guard = self.state.lock().await;
        guard
            .blocks
            .get(index as usize)
            .cloned()
            .ok_or(ChainError::NotFound(index))
    }

    pub async fn get_block_by_hash(&self, hash: &Hash) -> Result<Block, ChainError> {
        let guard = self.state.lock().await;
        let idx = *guard
            .by_hash
            .get(hash)
            .ok_or(ChainError::NotFoundByHash(*hash))?;
        Ok(guard.blocks[idx].clone())
    }

    pub async fn get_block_header(&self, hash_hex: &str) -> Result<BlockHeader, ChainError> {
        let hash = Hash::from_hex(hash_hex).map_err(|_| ChainError::NotFoundByHash(Hash::zero()))?;
        Ok(self.get_block_by_hash(&hash).await?.header)
    }

    pub async fn get_block_hash(&self, index: u64) -> Result<Hash, ChainError> {
        Ok(self.get_block_by_index(index).await?.hash)
    }

    pub fn confirmations_of(&self, index: u64) -> Option<u64> {
        self.state.try_lock().ok().and_then(|guard| guard.confirmations.get(index as usize).copied())
    }

    /// Appends `block`, persists it, and broadcasts it on `BlockPipe`.
    /// A persistence failure is logged but does not roll back the
    /// in-memory append, a known consistency gap.
    pub async fn update_chain(&self, block: Block) -> Result<(), ChainError> {
        {
            let mut guard = self.state.lock().await;
            guard.push(block.clone());
        }

        if let ChainMode::Persistent(path) = &self.mode {
            if let Err(e) = append_block(path, &block) {
                tracing::error!(error = %e, "vault file append failed; in-memory state remains authoritative");
            }
        }

        if let Some(sender) = &self.broadcaster {
            if sender.send(block).await.is_err() {
                tracing::warn!("no subscribers listening on BlockPipe");
            }
        }
        Ok(())
    }

    pub fn idle(&self) {
        self.mining_paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.mining_paused.store(false, Ordering::SeqCst);
    }

    pub fn is_idle(&self) -> bool {
        self.mining_paused.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerera_types::Tx;

    #[tokio::test]
    async fn bootstrap_in_memory_creates_genesis() {
        let chain = Chain::bootstrap(7, 1, 1_000_000, ChainMode::InMemory)
            .await
            .unwrap();
        let latest = chain.get_latest().await;
        assert_eq!(latest.header.index, 0);
        assert_eq!(latest.header.prev_hash, Hash::zero());
    }

    #[tokio::test]
    async fn update_chain_extends_head_and_bumps_confirmations() {
        let chain = Chain::bootstrap(7, 1, 1_000_000, ChainMode::InMemory)
            .await
            .unwrap();
        let genesis = chain.get_latest().await;

        let header = BlockHeader {
            index: 1,
            height: 1,
            prev_hash: genesis.hash,
            timestamp_ms: 1,
            difficulty: 1,
            gas_limit: 1_000_000,
            gas_used: 0,
            chain_id: 7,
            producer: Address::zero(),
            nonce: 0,
            root: Block::tx_root(&[]),
            size: 0,
            extra: Vec::new(),
            v: HEADER_VERSION,
        };
        let block = Block::seal(header, vec![Tx::coinbase(Address::zero(), 1)]);
        chain.update_chain(block.clone()).await.unwrap();

        let latest = chain.get_latest().await;
        assert_eq!(latest.hash, block.hash);
        assert_eq!(chain.confirmations_of(0), Some(1));
        assert_eq!(chain.confirmations_of(1), Some(0));
        assert_eq!(
            chain.get_block_by_hash(&block.hash).await.unwrap().hash,
            block.hash
        );
    }

    #[tokio::test]
    async fn persistent_mode_reloads_from_vault_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.dat");
        {
            let chain = Chain::bootstrap(7, 1, 1_000_000, ChainMode::Persistent(path.clone()))
                .await
                .unwrap();
            assert_eq!(chain.get_info().await.total_blocks, 1);
        }
        let chain = Chain::bootstrap(7, 1, 1_000_000, ChainMode::Persistent(path))
            .await
            .unwrap();
        assert_eq!(chain.get_info().await.total_blocks, 1);
    }

    #[tokio::test]
    async fn idle_and_resume_toggle_the_flag() {
        let chain = Chain::bootstrap(7, 1, 1_000_000, ChainMode::InMemory)
            .await
            .unwrap();
        assert!(!chain.is_idle());
        chain.idle();
        assert!(chain.is_idle());
        chain.resume();
        assert!(!chain.is_idle());
    }
}
