use crate::error::MempoolError;
use crate::observer::ObserverRegistry;
use cerera_hash::Hash;
use cerera_types::Tx;
use indexmap::IndexMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct MempoolInfo {
    pub size: usize,
    pub bytes: usize,
    pub hashes: Vec<Hash>,
    pub txs: Vec<Tx>,
}

struct PoolInner {
    entries: IndexMap<Hash, Tx>,
}

/// Bounded fingerprint-to-transaction map with admission policy and
/// observer fan-out (component C4).
#[derive(Clone)]
pub struct Mempool {
    inner: Arc<Mutex<PoolInner>>,
    observers: Arc<ObserverRegistry>,
    max_size: usize,
    min_gas_price: u64,
}

impl Mempool {
    pub fn new(max_size: usize, min_gas_price: u64) -> Self {
        Mempool {
            inner: Arc::new(Mutex::new(PoolInner {
                entries: IndexMap::new(),
            })),
            observers: Arc::new(ObserverRegistry::new()),
            max_size,
            min_gas_price,
        }
    }

    pub fn register_observer(&self) -> (u64, mpsc::UnboundedReceiver<Tx>) {
        self.observers.register()
    }

    pub fn deregister_observer(&self, id: u64) {
        self.observers.deregister(id)
    }

    /// Admits `tx` iff `entries < max_size ∧ tx.gas_price ≥ min_gas_price`.
    /// Uses a non-blocking `try_lock` on the entries map, so a contended
    /// admission degrades to a dropped admission rather than stalling the
    /// caller on lock contention.
    pub fn queue(&self, tx: Tx) -> Result<(), MempoolError> {
        if tx.gas_price < self.min_gas_price {
            tracing::debug!(
                gas_price = tx.gas_price,
                floor = self.min_gas_price,
                "admission rejected: gas price below floor"
            );
            return Err(MempoolError::GasPriceTooLow(tx.gas_price, self.min_gas_price));
        }

        let hash = tx.hash();
        {
            let mut guard = self.inner.try_lock().map_err(|_| {
                tracing::debug!("admission rejected: pool busy under contention");
                MempoolError::Busy
            })?;
            if guard.entries.len() >= self.max_size && !guard.entries.contains_key(&hash) {
                tracing::debug!(max_size = self.max_size, "admission rejected: pool full");
                return Err(MempoolError::Full);
            }
            guard.entries.insert(hash, tx.clone());
        }
        self.observers.notify(&tx);
        Ok(())
    }

    pub fn get(&self, hash: &Hash) -> Option<Tx> {
        self.inner.lock().unwrap().entries.get(hash).cloned()
    }

    /// No ordering is guaranteed; callers must not assume insertion order.
    pub fn get_pending(&self) -> Vec<Tx> {
        self.inner.lock().unwrap().entries.values().cloned().collect()
    }

    pub fn remove(&self, hash: &Hash) -> Result<(), MempoolError> {
        let mut guard = self.inner.lock().unwrap();
        guard
            .entries
            .shift_remove(hash)
            .map(|_| ())
            .ok_or(MempoolError::NotFound(*hash))
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().entries.clear();
    }

    /// Always re-derived from the live map, never a stale cache, so
    /// eviction is always reflected.
    pub fn info(&self) -> MempoolInfo {
        let guard = self.inner.lock().unwrap();
        let hashes: Vec<Hash> = guard.entries.keys().copied().collect();
        let txs: Vec<Tx> = guard.entries.values().cloned().collect();
        let bytes = txs.iter().map(|tx| tx.canonical_bytes().len()).sum();
        MempoolInfo {
            size: guard.entries.len(),
            bytes,
            hashes,
            txs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerera_hash::Address;
    use cerera_types::TxKind;

    fn tx(nonce: u64, gas_price: u64) -> Tx {
        Tx::new(
            nonce,
            Address::zero(),
            Some(Address::zero()),
            1,
            21_000,
            gas_price,
            vec![],
            vec![],
            TxKind::Transfer,
        )
        .unwrap()
    }

    #[test]
    fn admits_above_gas_floor_and_rejects_below() {
        let pool = Mempool::new(10, 5);
        assert_eq!(
            pool.queue(tx(0, 1)),
            Err(MempoolError::GasPriceTooLow(1, 5))
        );
        assert!(pool.queue(tx(0, 5)).is_ok());
        assert_eq!(pool.info().size, 1);
    }

    #[test]
    fn duplicate_admission_is_idempotent() {
        let pool = Mempool::new(10, 0);
        let t = tx(0, 0);
        pool.queue(t.clone()).unwrap();
        pool.queue(t.clone()).unwrap();
        assert_eq!(pool.info().size, 1);
    }

    #[test]
    fn rejects_once_full() {
        let pool = Mempool::new(1, 0);
        pool.queue(tx(0, 0)).unwrap();
        assert_eq!(pool.queue(tx(1, 0)), Err(MempoolError::Full));
    }

    #[test]
    fn remove_and_clear_affect_info_immediately() {
        let pool = Mempool::new(10, 0);
        let t = tx(0, 0);
        pool.queue(t.clone()).unwrap();
        pool.remove(&t.hash()).unwrap();
        assert_eq!(pool.info().size, 0);

        pool.queue(tx(1, 0)).unwrap();
        pool.clear();
        assert_eq!(pool.info().size, 0);
    }
}
