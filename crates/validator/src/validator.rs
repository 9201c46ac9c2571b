use crate::error::{BlockValidationError, ValidatorError};
use cerera_chain::Chain;
use cerera_eventbus::ConsensusGate;
use cerera_hash::{meets_target, Address, Hash};
use cerera_types::{Block, Tx, TxKind, BLOCK_REWARD};
use cerera_vault::Vault;
use cerera_vm::BlockInfo;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

/// Minimum time between two faucet payouts to the same recipient.
pub const FAUCET_COOLDOWN_HOURS: u64 = 24;
const FAUCET_COOLDOWN_MS: u64 = FAUCET_COOLDOWN_HOURS * 60 * 60 * 1000;

#[derive(Debug, Clone)]
pub struct ExecutionReceipt {
    pub tx_hash: Hash,
    pub success: bool,
    pub gas_used: u64,
    pub contract_address: Option<Address>,
    pub error: Option<String>,
}

/// Structural checks, balance checks, tx execution dispatch and block
/// acceptance (component C5).
pub struct Validator {
    vault: Vault,
    chain: Arc<Chain>,
    gate: Arc<ConsensusGate>,
    faucet_last_claim_ms: Mutex<HashMap<Address, u64>>,
    propose_lock: AsyncMutex<()>,
}

impl Validator {
    pub fn new(vault: Vault, chain: Arc<Chain>, gate: Arc<ConsensusGate>) -> Self {
        Validator {
            vault,
            chain,
            gate,
            faucet_last_claim_ms: Mutex::new(HashMap::new()),
            propose_lock: AsyncMutex::new(()),
        }
    }

    /// Cheap structural check, independent of current vault state: a
    /// non-create tx must name a recipient, a create tx must carry
    /// non-empty init code and no recipient, and `gas_limit` must be
    /// non-zero for anything that isn't minted by the chain itself.
    pub fn validate_raw(&self, tx: &Tx) -> bool {
        match tx.kind {
            TxKind::ContractCreate => tx.to.is_none() && !tx.data.is_empty(),
            TxKind::Coinbase => tx.to.is_some(),
            _ => tx.to.is_some() && tx.gas_limit > 0,
        }
    }

    /// Verifies `from`'s balance covers `tx.value`. Read-only: does not
    /// mutate the vault. Logs the check so it is visible in the
    /// recoverable-error surfacing required of admission/validation
    /// failures.
    pub fn validate_tx(&self, tx: &Tx, from: &Address) -> bool {
        let balance = self.vault.get(from).map(|a| a.balance).unwrap_or(0);
        let ok = balance >= tx.value;
        if !ok {
            tracing::debug!(%from, value = tx.value, balance, "transaction fails balance check");
        }
        ok
    }

    /// Dispatches execution by `tx.kind` and mutates the vault accordingly.
    pub fn execute(&self, tx: &Tx, producer: Address, block: BlockInfo) -> ExecutionReceipt {
        let tx_hash = tx.hash();
        match tx.kind {
            TxKind::Coinbase => {
                let to = tx.to.unwrap_or(producer);
                self.vault.credit(to, BLOCK_REWARD);
                ExecutionReceipt {
                    tx_hash,
                    success: true,
                    gas_used: 0,
                    contract_address: None,
                    error: None,
                }
            }
            TxKind::Faucet => self.execute_faucet(tx, tx_hash),
            TxKind::Transfer => self.execute_transfer(tx, tx_hash),
            TxKind::ContractCreate => self.execute_creation(tx, tx_hash, block),
            TxKind::ContractCall => {
                let to = match tx.to {
                    Some(to) if self.vault.has_code(&to) => to,
                    _ => {
                        return ExecutionReceipt {
                            tx_hash,
                            success: false,
                            gas_used: 0,
                            contract_address: None,
                            error: Some(ValidatorError::ContractNotFound(
                                tx.to.unwrap_or(Address::zero()),
                            )
                            .to_string()),
                        }
                    }
                };
                self.execute_call(tx, to, tx_hash, block)
            }
        }
    }

    fn execute_faucet(&self, tx: &Tx, tx_hash: Hash) -> ExecutionReceipt {
        let Some(to) = tx.to else {
            return ExecutionReceipt {
                tx_hash,
                success: false,
                gas_used: 0,
                contract_address: None,
                error: Some(ValidatorError::MalformedTx.to_string()),
            };
        };
        let now = tx.nonce; // faucet txs carry the request timestamp in `nonce`
        let mut cooldowns = self.faucet_last_claim_ms.lock().unwrap();
        if let Some(&last) = cooldowns.get(&to) {
            if now.saturating_sub(last) < FAUCET_COOLDOWN_MS {
                return ExecutionReceipt {
                    tx_hash,
                    success: false,
                    gas_used: 0,
                    contract_address: None,
                    error: Some(ValidatorError::FaucetCooldown(to).to_string()),
                };
            }
        }
        cooldowns.insert(to, now);
        drop(cooldowns);
        self.vault.credit(to, tx.value);
        ExecutionReceipt {
            tx_hash,
            success: true,
            gas_used: 0,
            contract_address: None,
            error: None,
        }
    }

    fn execute_transfer(&self, tx: &Tx, tx_hash: Hash) -> ExecutionReceipt {
        let Some(to) = tx.to else {
            return ExecutionReceipt {
                tx_hash,
                success: false,
                gas_used: 0,
                contract_address: None,
                error: Some(ValidatorError::MalformedTx.to_string()),
            };
        };
        match self.vault.update_balance(tx.from, to, tx.value, tx_hash) {
            Ok(()) => ExecutionReceipt {
                tx_hash,
                success: true,
                gas_used: 0,
                contract_address: None,
                error: None,
            },
            Err(e) => ExecutionReceipt {
                tx_hash,
                success: false,
                gas_used: 0,
                contract_address: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn execute_creation(&self, tx: &Tx, tx_hash: Hash, block: BlockInfo) -> ExecutionReceipt {
        let sender_nonce = self.vault.get(&tx.from).map(|a| a.nonce).unwrap_or(0);
        let outcome = cerera_vm::execute_creation(
            tx.from,
            sender_nonce,
            &tx.data,
            tx.value,
            tx.gas_limit,
            &self.vault,
            block,
        );
        ExecutionReceipt {
            tx_hash,
            success: outcome.success,
            gas_used: outcome.gas_used,
            contract_address: Some(outcome.contract_address),
            error: outcome.error.map(|e| e.to_string()),
        }
    }

    fn execute_call(&self, tx: &Tx, to: Address, tx_hash: Hash, block: BlockInfo) -> ExecutionReceipt {
        let outcome =
            cerera_vm::execute_call(tx.from, to, &tx.data, tx.value, tx.gas_limit, &self.vault, block);
        ExecutionReceipt {
            tx_hash,
            success: outcome.success,
            gas_used: outcome.gas_used,
            contract_address: None,
            error: outcome.error.map(|e| e.to_string()),
        }
    }

    /// Checks header linkage, PoW, timestamp monotonicity and re-validates
    /// every non-coinbase tx's balance against a simulated overlay of the
    /// current vault (no vault mutation happens here).
    pub async fn validate_block(&self, block: &Block) -> Result<(), BlockValidationError> {
        let head = self.chain.get_latest().await;

        if block.header.prev_hash != head.hash
            || block.header.index != head.header.index + 1
            || block.header.height != head.header.height + 1
        {
            return Err(BlockValidationError::BadLinkage);
        }

        if block.header.timestamp_ms <= head.header.timestamp_ms {
            return Err(BlockValidationError::BadTimestamp);
        }

        let recomputed = cerera_hash::rx_hash(&Block::hash_preimage(&block.header, &block.transactions));
        let pow_ok = meets_target(&block.hash, block.header.difficulty).unwrap_or(false);
        if recomputed != block.hash || !pow_ok {
            return Err(BlockValidationError::BadPoW);
        }

        if block.header.gas_used > block.header.gas_limit {
            return Err(BlockValidationError::BadGasAccounting);
        }

        let mut overlay: HashMap<Address, i128> = HashMap::new();
        for tx in &block.transactions {
            if matches!(tx.kind, TxKind::Coinbase | TxKind::Faucet) {
                continue;
            }
            let balance = self.vault.get(&tx.from).map(|a| a.balance).unwrap_or(0) as i128;
            let spent = overlay.entry(tx.from).or_insert(0);
            if balance + *spent < tx.value as i128 {
                return Err(BlockValidationError::BadGasAccounting);
            }
            *spent -= tx.value as i128;
        }

        Ok(())
    }

    /// Runs every transaction in `block` against the vault, in order,
    /// mutating account/code/storage state. A tx-level failure
    /// (insufficient funds, a reverted or out-of-gas contract call, ...)
    /// only fails that tx; it is never fatal to the block.
    fn execute_block(&self, block: &Block) -> Vec<ExecutionReceipt> {
        let block_info = BlockInfo {
            index: block.header.index,
            producer: block.header.producer,
            difficulty: block.header.difficulty,
            gas_limit: block.header.gas_limit,
            timestamp_ms: block.header.timestamp_ms,
            chain_id: block.header.chain_id,
        };
        block
            .transactions
            .iter()
            .map(|tx| {
                let receipt = self.execute(tx, block.header.producer, block_info);
                if !receipt.success {
                    tracing::debug!(tx_hash = %receipt.tx_hash, error = ?receipt.error, "transaction execution failed; gas still charged, block proceeds");
                }
                receipt
            })
            .collect()
    }

    /// Validates `block`, executes its transactions against the vault, and
    /// if consensus has started, hands it to the chain for append.
    /// Dropping a block when consensus has not started is expected: the
    /// miner's tick-driven loop always attempts a mine and relies on this
    /// gate to discard the result.
    pub async fn propose_block(&self, block: Block) -> Result<(), BlockValidationError> {
        let _guard = self.propose_lock.lock().await;

        self.validate_block(&block).await?;

        if !self.gate.is_consensus_started() {
            tracing::warn!(hash = %block.hash, "consensus not started; dropping proposed block");
            return Err(BlockValidationError::ConsensusNotStarted);
        }

        let _receipts = self.execute_block(&block);

        self.chain
            .update_chain(block)
            .await
            .map_err(|_| BlockValidationError::BadLinkage)?;
        Ok(())
    }

    pub fn service_name(&self) -> &'static str {
        "validator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerera_chain::ChainMode;
    use cerera_eventbus::ConsensusStatus;
    use cerera_types::{BlockHeader, HEADER_VERSION};

    fn block_info() -> BlockInfo {
        BlockInfo {
            index: 1,
            producer: Address::zero(),
            difficulty: 1,
            gas_limit: 1_000_000,
            timestamp_ms: 1,
            chain_id: 7,
        }
    }

    async fn validator() -> (Validator, Vault, Arc<Chain>, Arc<ConsensusGate>) {
        let vault = Vault::new();
        let chain = Arc::new(
            Chain::bootstrap(7, 1, 1_000_000, ChainMode::InMemory)
                .await
                .unwrap(),
        );
        let gate = Arc::new(ConsensusGate::new());
        let validator = Validator::new(vault.clone(), chain.clone(), gate.clone());
        (validator, vault, chain, gate)
    }

    #[tokio::test]
    async fn validate_raw_rejects_malformed_shapes() {
        let (validator, _vault, _chain, _gate) = validator().await;
        let coinbase = Tx::coinbase(Address::zero(), 1);
        assert!(validator.validate_raw(&coinbase));

        let zero_gas = Tx::new(
            0,
            Address::zero(),
            Some(Address::zero()),
            0,
            0,
            1,
            vec![],
            vec![],
            TxKind::Transfer,
        )
        .unwrap();
        assert!(!validator.validate_raw(&zero_gas));
    }

    #[tokio::test]
    async fn coinbase_credits_without_debit_or_nonce_bump() {
        let (validator, vault, _chain, _gate) = validator().await;
        let producer = Address::from_hex("0x00000000000000000000000000000000000001").unwrap();
        let tx = Tx::coinbase(producer, 1);
        let receipt = validator.execute(&tx, producer, block_info());
        assert!(receipt.success);
        assert_eq!(vault.get(&producer).unwrap().balance, BLOCK_REWARD);
        assert_eq!(vault.get(&producer).unwrap().nonce, 0);
    }

    #[tokio::test]
    async fn faucet_enforces_cooldown_per_recipient() {
        let (validator, vault, _chain, _gate) = validator().await;
        let recipient = Address::from_hex("0x00000000000000000000000000000000000002").unwrap();
        let tx = Tx::new(
            0,
            Address::zero(),
            Some(recipient),
            10,
            0,
            0,
            vec![],
            vec![],
            TxKind::Faucet,
        )
        .unwrap();
        let first = validator.execute(&tx, Address::zero(), block_info());
        assert!(first.success);
        assert_eq!(vault.get(&recipient).unwrap().balance, 10);

        let second = validator.execute(&tx, Address::zero(), block_info());
        assert!(!second.success);
    }

    #[tokio::test]
    async fn propose_block_is_dropped_when_consensus_not_started() {
        let (validator, vault, chain, _gate) = validator().await;
        let producer = Address::zero();
        vault.seed(producer, 0);
        let head = chain.get_latest().await;
        let header = BlockHeader {
            index: head.header.index + 1,
            height: head.header.height + 1,
            prev_hash: head.hash,
            timestamp_ms: head.header.timestamp_ms + 1,
            difficulty: 1,
            gas_limit: 1_000_000,
            gas_used: 0,
            chain_id: 7,
            producer,
            nonce: 0,
            root: Block::tx_root(&[]),
            size: 0,
            extra: Vec::new(),
            v: HEADER_VERSION,
        };
        let block = Block::seal(header, Vec::new());
        let result = validator.propose_block(block).await;
        assert_eq!(result, Err(BlockValidationError::ConsensusNotStarted));
    }

    #[tokio::test]
    async fn propose_block_appends_once_consensus_started() {
        let (validator, vault, chain, gate) = validator().await;
        let producer = Address::zero();
        vault.seed(producer, 0);
        gate.set_status(ConsensusStatus::Local);
        let head = chain.get_latest().await;
        let header = BlockHeader {
            index: head.header.index + 1,
            height: head.header.height + 1,
            prev_hash: head.hash,
            timestamp_ms: head.header.timestamp_ms + 1,
            difficulty: 1,
            gas_limit: 1_000_000,
            gas_used: 0,
            chain_id: 7,
            producer,
            nonce: 0,
            root: Block::tx_root(&[]),
            size: 0,
            extra: Vec::new(),
            v: HEADER_VERSION,
        };
        let block = Block::seal(header, Vec::new());
        validator.propose_block(block.clone()).await.unwrap();
        assert_eq!(chain.get_latest().await.hash, block.hash);
    }
}
