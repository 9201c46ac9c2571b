use cerera_hash::Hash;

/// Block-level failures: a block is rejected and the miner retries with
/// a fresh template. Never fatal to the chain itself.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("block {0} has bad linkage to its predecessor")]
    BadLinkage(Hash),
    #[error("block {0} does not satisfy its PoW target")]
    BadPoW(Hash),
    #[error("block {0} timestamp does not advance on its predecessor")]
    BadTimestamp(Hash),
    #[error("block {0} exceeds its gas limit")]
    BadGasAccounting(Hash),
    #[error("no block at index {0}")]
    NotFound(u64),
    #[error("no block with hash {0}")]
    NotFoundByHash(Hash),
    #[error("vault file I/O error: {0}")]
    VaultIo(#[from] std::io::Error),
    #[error("vault file line is not valid JSON: {0}")]
    VaultDecode(#[source] serde_json::Error),
}
