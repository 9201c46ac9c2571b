use cerera_chain::ChainError;
use cerera_hash::AddressParseError;
use cerera_mempool::MempoolError;
use cerera_validator::BlockValidationError;

/// Node-level failures: a thin pass-through of each component's own error
/// enum rather than a second taxonomy layered on top.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("invalid producer address: {0}")]
    BadProducerAddress(#[from] AddressParseError),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Mempool(#[from] MempoolError),
    #[error(transparent)]
    Block(#[from] BlockValidationError),
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        source: serde_json::Error,
    },
}
