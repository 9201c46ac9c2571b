use crate::error::NodeError;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line flags for the `cerera-node` binary: clap owns the flags a
/// human types, `NodeConfig` owns the validated, ready-to-wire values a
/// `Node` is built from.
#[derive(Debug, Parser)]
#[command(author, version, about = "Cerera permissioned chain node", long_about = None)]
pub struct Cli {
    /// Chain id stamped into every block header and checked by the VM's
    /// `CHAINID` opcode.
    #[arg(long, env = "CERERA_CHAIN_ID", default_value_t = 1)]
    pub chain_id: u64,

    /// Genesis and (since the node has no retargeting) permanent PoW
    /// difficulty.
    #[arg(long, env = "CERERA_DIFFICULTY", default_value_t = 1)]
    pub difficulty: u64,

    /// Per-block gas limit.
    #[arg(long, env = "CERERA_GAS_LIMIT", default_value_t = 8_000_000)]
    pub gas_limit: u64,

    /// Maximum number of transactions the mempool holds at once.
    #[arg(long, env = "CERERA_MEMPOOL_SIZE", default_value_t = 4_096)]
    pub mempool_max_size: usize,

    /// Transactions below this gas price are refused admission.
    #[arg(long, env = "CERERA_MIN_GAS_PRICE", default_value_t = 0)]
    pub min_gas_price: u64,

    /// How often the miner attempts a proof-of-work search.
    #[arg(long, env = "CERERA_MINE_TICK_MS", default_value_t = 500)]
    pub mine_tick_ms: u64,

    /// Nonces tried per search before a tick gives up and waits for the
    /// next one.
    #[arg(long, env = "CERERA_MINE_BATCH_SIZE", default_value_t = 200_000)]
    pub mine_batch_size: u64,

    /// Address credited with mined blocks' coinbase reward.
    #[arg(long, env = "CERERA_PRODUCER")]
    pub producer: Option<String>,

    /// Path to the vault journal file. Omit to run fully in-memory.
    #[arg(long, env = "CERERA_VAULT_FILE")]
    pub vault_file: Option<PathBuf>,

    /// Start consensus immediately instead of waiting for an external
    /// bootstrap signal; only meaningful for a single, locally-run node.
    #[arg(long, env = "CERERA_SOLO", default_value_t = false)]
    pub solo: bool,

    /// Optional JSON file holding a `NodeConfig` snapshot. When given, the
    /// file is authoritative and the rest of the CLI flags are ignored; a
    /// deployment picks one source or the other, not a merge of both.
    #[arg(long, env = "CERERA_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

/// Validated configuration a `Node` is built from. Also the shape
/// persisted to/loaded from an optional TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub chain_id: u64,
    pub difficulty: u64,
    pub gas_limit: u64,
    pub mempool_max_size: usize,
    pub min_gas_price: u64,
    pub mine_tick: Duration,
    pub mine_batch_size: u64,
    pub producer: String,
    pub vault_file: Option<PathBuf>,
    pub solo: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            chain_id: 1,
            difficulty: 1,
            gas_limit: 8_000_000,
            mempool_max_size: 4_096,
            min_gas_price: 0,
            mine_tick: Duration::from_millis(500),
            mine_batch_size: 200_000,
            producer: cerera_hash::Address::zero().to_hex(),
            vault_file: None,
            solo: false,
        }
    }
}

impl From<Cli> for NodeConfig {
    fn from(cli: Cli) -> Self {
        NodeConfig {
            chain_id: cli.chain_id,
            difficulty: cli.difficulty,
            gas_limit: cli.gas_limit,
            mempool_max_size: cli.mempool_max_size,
            min_gas_price: cli.min_gas_price,
            mine_tick: Duration::from_millis(cli.mine_tick_ms),
            mine_batch_size: cli.mine_batch_size,
            producer: cli
                .producer
                .unwrap_or_else(|| cerera_hash::Address::zero().to_hex()),
            vault_file: cli.vault_file,
            solo: cli.solo,
        }
    }
}

impl NodeConfig {
    /// Resolves a `Cli` into a `NodeConfig`, preferring a JSON config file
    /// when `--config-file`/`CERERA_CONFIG_FILE` names one. A file, when
    /// present, is authoritative over the rest of the CLI flags; a
    /// deployment either drives a node entirely from flags/env or entirely
    /// from a checked-in file, not a field-by-field merge of both.
    pub fn resolve(cli: Cli) -> Result<Self, NodeError> {
        match &cli.config_file {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| NodeError::ConfigRead {
                    path: path.display().to_string(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| NodeError::ConfigParse {
                    path: path.display().to_string(),
                    source,
                })
            }
            None => Ok(NodeConfig::from(cli)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_runs_fully_in_memory() {
        let cfg = NodeConfig::default();
        assert!(cfg.vault_file.is_none());
        assert_eq!(cfg.chain_id, 1);
    }

    #[test]
    fn cli_without_a_producer_falls_back_to_the_zero_address() {
        let cli = Cli::parse_from(["cerera-node"]);
        let cfg = NodeConfig::from(cli);
        assert_eq!(cfg.producer, cerera_hash::Address::zero().to_hex());
    }

    #[test]
    fn resolve_without_a_config_file_falls_back_to_cli() {
        let cli = Cli::parse_from(["cerera-node", "--chain-id", "9"]);
        let cfg = NodeConfig::resolve(cli).unwrap();
        assert_eq!(cfg.chain_id, 9);
    }

    #[test]
    fn resolve_prefers_a_config_file_when_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.json");
        let mut file_cfg = NodeConfig::default();
        file_cfg.chain_id = 42;
        std::fs::write(&path, serde_json::to_string(&file_cfg).unwrap()).unwrap();

        let cli = Cli::parse_from([
            "cerera-node",
            "--chain-id",
            "9",
            "--config-file",
            path.to_str().unwrap(),
        ]);
        let cfg = NodeConfig::resolve(cli).unwrap();
        assert_eq!(cfg.chain_id, 42);
    }

    #[test]
    fn resolve_reports_a_readable_error_for_a_missing_file() {
        let cli = Cli::parse_from(["cerera-node", "--config-file", "/no/such/file.json"]);
        assert!(matches!(
            NodeConfig::resolve(cli),
            Err(NodeError::ConfigRead { .. })
        ));
    }
}
