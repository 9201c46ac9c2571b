mod chain;
mod error;
mod persistence;

pub use chain::{Chain, ChainInfo, ChainMode};
pub use error::ChainError;
pub use persistence::{append_block, read_vault_file};
