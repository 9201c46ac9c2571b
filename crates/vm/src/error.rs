/// `OutOfGas` and `Revert` are recoverable at the transaction level (the
/// tx fails, the block continues); the rest are also tx-level failures
/// and never fatal to the block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("invalid opcode 0x{0:02x} at pc {1}")]
    InvalidOpcode(u8, usize),
    #[error("jump destination {0} is not a JUMPDEST")]
    InvalidJump(usize),
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack overflow")]
    StackOverflow,
    #[error("memory access out of bounds")]
    MemoryOutOfBounds,
    #[error("out of gas")]
    OutOfGas,
    #[error("reverted")]
    Revert(Vec<u8>),
    #[error("contract not found")]
    ContractNotFound,
    #[error("execution error: {0}")]
    ExecutionError(String),
}

impl VmError {
    /// Every failure class is recoverable at the transaction level. This
    /// flag only distinguishes `Revert` (explicit, carries return data)
    /// from the rest for callers that want to surface it differently.
    pub fn is_revert(&self) -> bool {
        matches!(self, VmError::Revert(_))
    }
}
