use crate::error::VmError;

/// Gas schedule constants. Must be reproduced exactly: every node running
/// the same bytecode has to burn the same gas for the same execution, or
/// block validation would diverge.
pub mod schedule {
    pub const BASE: u64 = 2;
    pub const VERY_LOW: u64 = 3;
    pub const LOW: u64 = 5;
    pub const MID: u64 = 8;
    pub const HIGH: u64 = 10;
    pub const SLOAD: u64 = 100;
    pub const SSTORE_BASE: u64 = 20_000;
    pub const SSTORE_SET_SURCHARGE: u64 = 20_000;
    pub const SSTORE_CLEAR_REFUND: u64 = 15_000;
    pub const MEMORY_WORD: u64 = 3;
    pub const CALL_BASE: u64 = 700;
    pub const CALL_VALUE_SURCHARGE: u64 = 9_000;
}

#[derive(Debug, Clone, Copy)]
pub struct GasMeter {
    limit: u64,
    used: u64,
    refund: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        GasMeter {
            limit,
            used: 0,
            refund: 0,
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn refund(&self) -> u64 {
        self.refund
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    pub fn consume(&mut self, amount: u64) -> Result<(), VmError> {
        match self.used.checked_add(amount) {
            Some(total) if total <= self.limit => {
                self.used = total;
                Ok(())
            }
            _ => Err(VmError::OutOfGas),
        }
    }

    pub fn add_refund(&mut self, amount: u64) {
        self.refund += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_fails_past_limit() {
        let mut g = GasMeter::new(10);
        g.consume(6).unwrap();
        assert_eq!(g.consume(5), Err(VmError::OutOfGas));
        assert_eq!(g.used(), 6);
    }
}
