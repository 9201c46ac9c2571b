//! Account, code and storage state store (component C2).

mod error;
mod vault;
mod wallet;

pub use error::VaultError;
pub use vault::Vault;
