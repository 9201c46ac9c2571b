use cerera_hash::Address;
use cerera_types::{Block, BlockHeader, Tx, BLOCK_REWARD, HEADER_VERSION};
use std::time::{SystemTime, UNIX_EPOCH};

/// The miner's in-progress block before a valid PoW nonce is found.
#[derive(Debug, Clone)]
pub struct Template {
    pub header: BlockHeader,
    pub transactions: Vec<Tx>,
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the epoch")
        .as_millis() as u64
}

/// Builds a fresh template from the chain head `head`, injecting a coinbase
/// transaction and then greedily draining `pending` while its gas fits the
/// block's limit.
///
/// `pending` order is whatever the mempool happened to hand back; the
/// mempool makes no ordering guarantee, so the miner must not rely on one.
pub fn build_template(
    head: &Block,
    producer: Address,
    chain_id: u64,
    pending: Vec<Tx>,
) -> Template {
    let header = BlockHeader {
        index: head.header.index + 1,
        height: head.header.height + 1,
        prev_hash: head.hash,
        timestamp_ms: now_ms().max(head.header.timestamp_ms + 1),
        difficulty: head.header.difficulty,
        gas_limit: head.header.gas_limit,
        gas_used: 0,
        chain_id,
        producer,
        nonce: head.header.nonce,
        root: cerera_hash::Hash::zero(),
        size: 0,
        extra: Vec::new(),
        v: HEADER_VERSION,
    };

    let coinbase = Tx::coinbase(producer, head.header.nonce);
    let mut transactions = vec![coinbase];
    let mut gas_used: u64 = 0;

    for tx in pending {
        // Faucet and coinbase transactions never count against the
        // block's gas budget.
        if matches!(tx.kind, cerera_types::TxKind::Faucet | cerera_types::TxKind::Coinbase) {
            transactions.push(tx);
            continue;
        }
        match gas_used.checked_add(tx.gas_limit) {
            Some(next) if next <= header.gas_limit => {
                gas_used = next;
                transactions.push(tx);
            }
            // First overflow halts further inclusion.
            _ => break,
        }
    }

    let mut header = header;
    header.gas_used = gas_used;
    header.root = Block::tx_root(&transactions);

    Template {
        header,
        transactions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cerera_hash::Hash;
    use cerera_types::TxKind;

    fn genesis() -> Block {
        Block::seal(
            BlockHeader {
                index: 0,
                height: 0,
                prev_hash: Hash::zero(),
                timestamp_ms: 0,
                difficulty: 1,
                gas_limit: 1_000,
                gas_used: 0,
                chain_id: 7,
                producer: Address::zero(),
                nonce: 0,
                root: Block::tx_root(&[]),
                size: 0,
                extra: Vec::new(),
                v: HEADER_VERSION,
            },
            Vec::new(),
        )
    }

    fn transfer(gas_limit: u64) -> Tx {
        Tx::new(
            0,
            Address::zero(),
            Some(Address::zero()),
            1,
            gas_limit,
            1,
            vec![],
            vec![],
            TxKind::Transfer,
        )
        .unwrap()
    }

    #[test]
    fn template_links_to_head_and_injects_coinbase() {
        let head = genesis();
        let template = build_template(&head, Address::zero(), 7, Vec::new());
        assert_eq!(template.header.index, 1);
        assert_eq!(template.header.height, 1);
        assert_eq!(template.header.prev_hash, head.hash);
        assert_eq!(template.transactions.len(), 1);
        assert_eq!(template.transactions[0].kind, TxKind::Coinbase);
        assert_eq!(template.transactions[0].value, BLOCK_REWARD);
    }

    #[test]
    fn first_overflowing_tx_halts_inclusion() {
        let head = genesis(); // gas_limit = 1_000
        let pending = vec![transfer(400), transfer(400), transfer(400)];
        let template = build_template(&head, Address::zero(), 7, pending);
        // coinbase + first two transfers (800 gas); the third would hit 1200 > 1000
        assert_eq!(template.transactions.len(), 3);
        assert_eq!(template.header.gas_used, 800);
    }

    #[test]
    fn faucet_and_coinbase_do_not_count_against_gas_used() {
        let head = genesis();
        let faucet = Tx::new(
            0,
            Address::zero(),
            Some(Address::zero()),
            10,
            10_000, // would overflow the 1_000 gas_limit if counted
            0,
            vec![],
            vec![],
            TxKind::Faucet,
        )
        .unwrap();
        let template = build_template(&head, Address::zero(), 7, vec![faucet]);
        assert_eq!(template.header.gas_used, 0);
        assert_eq!(template.transactions.len(), 2);
    }
}
