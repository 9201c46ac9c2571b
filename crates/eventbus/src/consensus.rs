use cerera_hash::Address;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsensusStatus {
    Idle,
    Local,
    Networked,
}

/// Network address of a peer node, opaque to everything but the (external)
/// transport layer.
pub type NetAddr = String;

struct GateState {
    status: ConsensusStatus,
    voters: HashSet<Address>,
    nodes: HashMap<Address, NetAddr>,
}

/// Consensus start gate. Block production waits for a non-`Idle`
/// status; the validator consults it before accepting a proposed block.
/// The broadcast/network side of this is an external collaborator; this
/// type only tracks the gate's local view.
pub struct ConsensusGate {
    state: RwLock<GateState>,
}

impl Default for ConsensusGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsensusGate {
    pub fn new() -> Self {
        ConsensusGate {
            state: RwLock::new(GateState {
                status: ConsensusStatus::Idle,
                voters: HashSet::new(),
                nodes: HashMap::new(),
            }),
        }
    }

    pub fn is_consensus_started(&self) -> bool {
        self.state.read().unwrap().status != ConsensusStatus::Idle
    }

    pub fn status(&self) -> ConsensusStatus {
        self.state.read().unwrap().status
    }

    pub fn set_status(&self, status: ConsensusStatus) {
        let mut guard = self.state.write().unwrap();
        if guard.status != status {
            tracing::info!(?status, "consensus gate status changed");
        }
        guard.status = status;
    }

    pub fn add_voter(&self, addr: Address) {
        self.state.write().unwrap().voters.insert(addr);
    }

    pub fn add_node(&self, addr: Address, net_addr: NetAddr) {
        self.state.write().unwrap().nodes.insert(addr, net_addr);
    }

    pub fn get_voters(&self) -> Vec<Address> {
        self.state.read().unwrap().voters.iter().copied().collect()
    }

    pub fn get_nodes(&self) -> HashMap<Address, NetAddr> {
        self.state.read().unwrap().nodes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_and_blocks_production() {
        let gate = ConsensusGate::new();
        assert!(!gate.is_consensus_started());
        gate.set_status(ConsensusStatus::Local);
        assert!(gate.is_consensus_started());
    }

    #[test]
    fn tracks_voters_and_nodes() {
        let gate = ConsensusGate::new();
        let addr = Address::zero();
        gate.add_voter(addr);
        gate.add_node(addr, "127.0.0.1:9000".to_string());
        assert_eq!(gate.get_voters(), vec![addr]);
        assert_eq!(gate.get_nodes().get(&addr).unwrap(), "127.0.0.1:9000");
    }
}
