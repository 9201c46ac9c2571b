//! End-to-end scenarios matching the node's testable-properties list:
//! genesis + transfer, PoW satisfying its target, contract creation/call,
//! REVERT rollback, mempool capacity, and head-change preemption.

use cerera_hash::{derive_contract_address, meets_target, Address};
use cerera_node::{Node, NodeConfig};
use cerera_types::TxKind;
use cerera_vm::BlockInfo;
use primitive_types::U256;
use std::time::Duration;

fn config(chain_id: u64, difficulty: u64, gas_limit: u64) -> NodeConfig {
    NodeConfig {
        chain_id,
        difficulty,
        gas_limit,
        mempool_max_size: 4_096,
        min_gas_price: 0,
        mine_tick: Duration::from_millis(10),
        mine_batch_size: 500_000,
        producer: Address::from_hex("0x0000000000000000000000000000000000000ff1")
            .unwrap()
            .to_hex(),
        vault_file: None,
        solo: true,
    }
}

fn block_info(node: &Node) -> BlockInfo {
    BlockInfo {
        index: 1,
        producer: Address::zero(),
        difficulty: node.config.difficulty,
        gas_limit: node.config.gas_limit,
        timestamp_ms: 1,
        chain_id: node.config.chain_id,
    }
}

#[tokio::test]
async fn s1_genesis_and_single_transfer() {
    let node = Node::bootstrap(config(12_345, 1, 1_000_000)).await.unwrap();
    let a = Address::from_hex("0x00000000000000000000000000000000000000aa").unwrap();
    let b = Address::from_hex("0x00000000000000000000000000000000000000bb").unwrap();
    node.vault.seed(a, 100);

    let tx = cerera_types::Tx::new(1, a, Some(b), 10, 3, 1, vec![], vec![], TxKind::Transfer).unwrap();
    node.submit_tx(tx).unwrap();

    let genesis = node.chain.get_latest().await;
    node.miner.tick().await;
    let latest = node.chain.get_latest().await;

    assert_eq!(latest.header.index, 1);
    assert_eq!(latest.header.prev_hash, genesis.hash);
    // No balance-based gas fee is modeled (see DESIGN.md): only `tx.value`
    // moves between accounts.
    assert_eq!(node.vault.get(&a).unwrap().balance, 90);
    assert_eq!(node.vault.get(&b).unwrap().balance, 10);
    assert_eq!(node.pool.info().size, 0);
}

#[tokio::test]
async fn s2_pow_satisfies_target() {
    let node = Node::bootstrap(config(12_345, 1_000_000, 1_000_000))
        .await
        .unwrap();
    node.miner.tick().await;
    let latest = node.chain.get_latest().await;
    assert!(meets_target(&latest.hash, 1_000_000).unwrap());
}

#[tokio::test]
async fn s3_contract_creation_and_call() {
    let node = Node::bootstrap(config(1, 1, 1_000_000)).await.unwrap();
    let deployer = Address::from_hex("0x000000000000000000000000000000000000000c").unwrap();

    // Runtime: PUSH1 0x2a, PUSH1 0, MSTORE, PUSH1 32, PUSH1 0, RETURN
    let runtime: Vec<u8> = vec![0x70, 0x2a, 0x70, 0x00, 0x61, 0x70, 0x20, 0x70, 0x00, 0x84];
    let init_code = deploy_init_code(&runtime);

    let tx = cerera_types::Tx::new(
        0,
        deployer,
        None,
        0,
        1_000_000,
        1,
        init_code,
        vec![],
        TxKind::ContractCreate,
    )
    .unwrap();
    node.submit_tx(tx).unwrap();
    node.miner.tick().await;

    let contract = derive_contract_address(&deployer, 0);
    assert!(node.vault.has_code(&contract));
    assert_eq!(node.vault.get_code(&contract), runtime);

    let outcome = cerera_vm::execute_call(
        deployer,
        contract,
        &[],
        0,
        100_000,
        &node.vault,
        block_info(&node),
    );
    assert!(outcome.error.is_none(), "{:?}", outcome.error);
    assert_eq!(outcome.return_data.len(), 32);
    assert_eq!(outcome.return_data[31], 0x2a);
    assert!(outcome.return_data[..31].iter().all(|&b| b == 0));
}

#[tokio::test]
async fn s4_revert_rolls_back_storage() {
    let node = Node::bootstrap(config(1, 1, 1_000_000)).await.unwrap();
    let deployer = Address::from_hex("0x000000000000000000000000000000000000000d").unwrap();

    // Runtime: PUSH1 99, PUSH1 1, SSTORE, PUSH1 0, PUSH1 0, REVERT
    let runtime: Vec<u8> = vec![0x70, 0x63, 0x70, 0x01, 0x53, 0x70, 0x00, 0x70, 0x00, 0x85];
    let init_code = deploy_init_code(&runtime);

    let tx = cerera_types::Tx::new(
        0,
        deployer,
        None,
        0,
        1_000_000,
        1,
        init_code,
        vec![],
        TxKind::ContractCreate,
    )
    .unwrap();
    node.submit_tx(tx).unwrap();
    node.miner.tick().await;

    let contract = derive_contract_address(&deployer, 0);
    assert!(node.vault.has_code(&contract));

    let outcome = cerera_vm::execute_call(
        deployer,
        contract,
        &[],
        0,
        100_000,
        &node.vault,
        block_info(&node),
    );
    assert!(!outcome.success);
    assert_eq!(node.vault.get_storage(&contract, U256::from(1)), U256::zero());
}

#[tokio::test]
async fn s5_mempool_capacity() {
    let mut cfg = config(1, 1, 1_000_000);
    cfg.mempool_max_size = 3;
    let node = Node::bootstrap(cfg).await.unwrap();

    let mut accepted = 0;
    let mut rejected = 0;
    for i in 0..5u64 {
        let mut bytes = [0u8; 20];
        bytes[19] = i as u8;
        let from = Address(bytes);
        let tx =
            cerera_types::Tx::new(i, from, Some(from), 1, 21_000, 1, vec![], vec![], TxKind::Transfer)
                .unwrap();
        match node.submit_tx(tx) {
            Ok(()) => accepted += 1,
            Err(_) => rejected += 1,
        }
    }

    assert_eq!(node.pool.info().size, 3);
    assert_eq!(accepted, 3);
    assert_eq!(rejected, 2);
}

#[tokio::test]
async fn s6_head_change_preempts_miner() {
    let node = Node::bootstrap(config(1, 1, 1_000_000)).await.unwrap();
    let genesis = node.chain.get_latest().await;

    // A test hook externally advances the chain to height 1 while the
    // miner would otherwise have been searching against genesis.
    let header = cerera_types::BlockHeader {
        index: 1,
        height: 1,
        prev_hash: genesis.hash,
        timestamp_ms: genesis.header.timestamp_ms + 1,
        difficulty: 1,
        gas_limit: 1_000_000,
        gas_used: 0,
        chain_id: 1,
        producer: Address::zero(),
        nonce: 0,
        root: cerera_types::Block::tx_root(&[]),
        size: 0,
        extra: Vec::new(),
        v: cerera_types::HEADER_VERSION,
    };
    let external_block = cerera_types::Block::seal(header, Vec::new());
    node.chain.update_chain(external_block.clone()).await.unwrap();

    node.miner.tick().await;
    let latest = node.chain.get_latest().await;
    assert_eq!(latest.header.index, 2);
    assert_eq!(latest.header.prev_hash, external_block.hash);
}

fn deploy_init_code(runtime: &[u8]) -> Vec<u8> {
    assert!(runtime.len() <= 32);
    let offset = 32 - runtime.len();
    let mut word = [0u8; 32];
    word[offset..].copy_from_slice(runtime);

    let mut init = vec![0x75]; // PUSH32
    init.extend_from_slice(&word);
    init.push(0x70); // PUSH1
    init.push(0x00); // mstore offset
    init.push(0x61); // MSTORE
    init.push(0x70); // PUSH1
    init.push(runtime.len() as u8); // return size
    init.push(0x70); // PUSH1
    init.push(offset as u8); // return offset
    init.push(0x84); // RETURN
    init
}
