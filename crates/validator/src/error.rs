use cerera_hash::Address;

/// Validation failures: a transaction is dropped from the block under
/// construction but the block itself proceeds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidatorError {
    #[error("account {0} has insufficient funds")]
    InsufficientFunds(Address),
    #[error("account {0} is frozen")]
    AccountFrozen(Address),
    #[error("transaction value must be non-negative and recipient well-formed")]
    MalformedTx,
    #[error("including this transaction would exceed the block gas limit")]
    GasLimitExceeded,
    #[error("faucet address {0} is still in its cooldown window")]
    FaucetCooldown(Address),
    #[error("contract {0} not found")]
    ContractNotFound(Address),
    #[error("contract {0} already exists")]
    ContractAlreadyExists(Address),
}

/// Block-level failures: the whole block is rejected; the miner retries
/// with a fresh template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockValidationError {
    #[error("block header does not link to the current head")]
    BadLinkage,
    #[error("block hash does not satisfy its PoW target")]
    BadPoW,
    #[error("block timestamp does not advance on its predecessor")]
    BadTimestamp,
    #[error("block gas accounting is inconsistent")]
    BadGasAccounting,
    #[error("consensus has not started; block dropped")]
    ConsensusNotStarted,
}
