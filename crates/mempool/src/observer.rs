use cerera_types::Tx;
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Fan-out registry, kept behind its own lock so registering or
/// deregistering an observer never contends with admission's lock on the
/// entries map.
#[derive(Default)]
pub struct ObserverRegistry {
    next_id: Mutex<u64>,
    observers: Mutex<Vec<(u64, mpsc::UnboundedSender<Tx>)>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        ObserverRegistry {
            next_id: Mutex::new(0),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn register(&self) -> (u64, mpsc::UnboundedReceiver<Tx>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            let id = *next_id;
            *next_id += 1;
            id
        };
        self.observers.lock().unwrap().push((id, sender));
        (id, receiver)
    }

    pub fn deregister(&self, id: u64) {
        self.observers.lock().unwrap().retain(|(oid, _)| *oid != id);
    }

    /// Notifies every live observer, dropping any whose receiver has
    /// already been dropped.
    pub fn notify(&self, tx: &Tx) {
        self.observers
            .lock()
            .unwrap()
            .retain(|(_, sender)| sender.send(tx.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.observers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerera_hash::Address;
    use cerera_types::TxKind;

    fn sample_tx() -> Tx {
        Tx::new(
            0,
            Address::zero(),
            Some(Address::zero()),
            1,
            21_000,
            1,
            vec![],
            vec![],
            TxKind::Transfer,
        )
        .unwrap()
    }

    #[test]
    fn notify_reaches_registered_observers_and_prunes_dropped_ones() {
        let registry = ObserverRegistry::new();
        let (id, mut rx) = registry.register();
        registry.notify(&sample_tx());
        assert!(rx.try_recv().is_ok());

        drop(rx);
        registry.notify(&sample_tx());
        assert!(registry.is_empty());

        registry.deregister(id);
    }
}
