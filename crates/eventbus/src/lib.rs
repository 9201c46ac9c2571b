//! Typed channels, the consensus start gate and the service registry
//! seam wiring the node's components together (component C8).

mod channels;
mod consensus;
mod service;

pub use channels::{
    block_funnel, block_pipe, out_bound_events, tx_funnel, BlockFunnelReceiver,
    BlockFunnelSender, BlockPipeReceiver, BlockPipeSender, NewHead, OutBoundEventsReceiver,
    OutBoundEventsSender, TxFunnelReceiver, TxFunnelSender, CHANNEL_CAPACITY,
};
pub use consensus::{ConsensusGate, ConsensusStatus, NetAddr};
pub use service::{Registry, Service, ServiceError, ServiceValue};
