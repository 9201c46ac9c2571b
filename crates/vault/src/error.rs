use cerera_hash::Address;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VaultError {
    #[error("account {0} has insufficient funds")]
    InsufficientFunds(Address),
    #[error("account {0} not found")]
    AccountNotFound(Address),
    #[error("wallet name must not be empty")]
    EmptyName,
}
