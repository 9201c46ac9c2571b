use crate::error::VaultError;
use crate::wallet::{self, GeneratedWallet};
use cerera_hash::{Address, Hash};
use cerera_types::Account;
use indexmap::IndexMap;
use primitive_types::U256;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

struct VaultInner {
    accounts: IndexMap<Address, Account>,
    code: HashMap<Address, Vec<u8>>,
    storage: HashMap<(Address, U256), U256>,
}

impl VaultInner {
    fn new() -> Self {
        VaultInner {
            accounts: IndexMap::new(),
            code: HashMap::new(),
            storage: HashMap::new(),
        }
    }

    fn entry(&mut self, addr: Address) -> &mut Account {
        self.accounts
            .entry(addr)
            .or_insert_with(|| Account::new(addr))
    }
}

/// Process-wide, single-writer account/code/storage state store (component
/// C2). All mutation serializes through one lock so validation never
/// observes a torn read.
#[derive(Clone)]
pub struct Vault {
    inner: Arc<RwLock<VaultInner>>,
}

impl Default for Vault {
    fn default() -> Self {
        Self::new()
    }
}

impl Vault {
    pub fn new() -> Self {
        Vault {
            inner: Arc::new(RwLock::new(VaultInner::new())),
        }
    }

    pub fn get(&self, addr: &Address) -> Option<Account> {
        self.inner.read().unwrap().accounts.get(addr).cloned()
    }

    pub fn get_all(&self) -> Vec<Account> {
        self.inner.read().unwrap().accounts.values().cloned().collect()
    }

    /// Creates a fresh account with a generated key pair. `passphrase`
    /// would encrypt the generated key at rest in a real key codec; that
    /// codec is out of scope here, so it is accepted and otherwise unused.
    /// Returns `(public_key, mnemonic, address)`.
    pub fn create(&self, name: &str, passphrase: &str) -> Result<(Vec<u8>, String, Address), VaultError> {
        if name.is_empty() {
            return Err(VaultError::EmptyName);
        }
        let _ = passphrase;
        let GeneratedWallet {
            public_key,
            mnemonic,
            address,
        } = wallet::generate();

        let mut guard = self.inner.write().unwrap();
        let account = guard.entry(address);
        account.name = name.to_string();
        Ok((public_key, mnemonic, address))
    }

    /// Directly seeds an account, used by genesis bootstrap and tests.
    pub fn seed(&self, address: Address, balance: u128) {
        let mut guard = self.inner.write().unwrap();
        let account = guard.entry(address);
        account.balance = balance;
    }

    /// Debits `from`, credits `to`, bumps `from`'s nonce and appends
    /// `tx_hash` to its `inputs`, all atomically under one write lock.
    pub fn update_balance(
        &self,
        from: Address,
        to: Address,
        value: u128,
        tx_hash: Hash,
    ) -> Result<(), VaultError> {
        let mut guard = self.inner.write().unwrap();

        if guard.entry(from).balance < value {
            tracing::debug!(%from, value, "update_balance rejected: insufficient funds");
            return Err(VaultError::InsufficientFunds(from));
        }

        {
            let sender = guard.entry(from);
            sender.balance -= value;
            sender.nonce += 1;
            sender.inputs.push(tx_hash);
        }
        guard.entry(to).balance += value;
        Ok(())
    }

    /// Credits `to` unconditionally, used for coinbase and faucet payouts.
    pub fn credit(&self, to: Address, value: u128) {
        let mut guard = self.inner.write().unwrap();
        guard.entry(to).balance += value;
    }

    pub fn store_code(&self, addr: Address, code: Vec<u8>) {
        let mut guard = self.inner.write().unwrap();
        let code_hash = cerera_hash::rx_hash(&code);
        guard.code.insert(addr, code);
        guard.entry(addr).code_hash = code_hash;
    }

    pub fn has_code(&self, addr: &Address) -> bool {
        self.inner.read().unwrap().code.contains_key(addr)
    }

    pub fn get_code(&self, addr: &Address) -> Vec<u8> {
        self.inner
            .read()
            .unwrap()
            .code
            .get(addr)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes `addr`'s code (and associated `code_hash`), used to roll
    /// back a failed contract creation.
    pub fn delete_code(&self, addr: &Address) {
        let mut guard = self.inner.write().unwrap();
        guard.code.remove(addr);
        if let Some(account) = guard.accounts.get_mut(addr) {
            account.code_hash = Hash::zero();
        }
    }

    /// Returns `0` for absent keys (EVM-style sparse semantics).
    pub fn get_storage(&self, addr: &Address, key: U256) -> U256 {
        self.inner
            .read()
            .unwrap()
            .storage
            .get(&(*addr, key))
            .copied()
            .unwrap_or_default()
    }

    /// Writing `0` is equivalent to deletion.
    pub fn set_storage(&self, addr: Address, key: U256, value: U256) {
        let mut guard = self.inner.write().unwrap();
        if value.is_zero() {
            guard.storage.remove(&(addr, key));
        } else {
            guard.storage.insert((addr, key), value);
        }
    }

    pub fn freeze(&self, addr: &Address) {
        let mut guard = self.inner.write().unwrap();
        if let Some(account) = guard.accounts.get_mut(addr) {
            account.status = cerera_types::AccountStatus::Frozen;
        }
    }
}
