use cerera_hash::Hash;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MempoolError {
    #[error("mempool is full")]
    Full,
    #[error("gas price {0} is below the floor of {1}")]
    GasPriceTooLow(u64, u64),
    #[error("mempool admission is busy, try again")]
    Busy,
    #[error("transaction {0} not found")]
    NotFound(Hash),
}
