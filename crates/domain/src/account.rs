use cerera_hash::{Address, Hash};
use serde::{Deserialize, Serialize};

/// Accounts can be frozen by governance without deleting their state, so
/// the validator has somewhere to park a sanction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AccountStatus {
    #[default]
    Active,
    Frozen,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    pub balance: u128,
    pub nonce: u64,
    pub name: String,
    pub status: AccountStatus,
    /// `Hash::zero()` for externally-owned accounts; non-zero selects the
    /// deployed bytecode in the vault's code table.
    pub code_hash: Hash,
    /// Hashes of transactions that debited this account, newest last.
    /// Unbounded: nothing trims it.
    pub inputs: Vec<Hash>,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Account {
            address,
            balance: 0,
            nonce: 0,
            name: String::new(),
            status: AccountStatus::Active,
            code_hash: Hash::zero(),
            inputs: Vec::new(),
        }
    }

    pub fn is_contract(&self) -> bool {
        !self.code_hash.is_zero()
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self.status, AccountStatus::Frozen)
    }
}
