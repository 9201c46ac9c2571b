use cerera_types::{Block, Tx};
use tokio::sync::mpsc;

/// Every channel buffers at least one item; a slow consumer blocks its
/// producer rather than silently dropping a block.
pub const CHANNEL_CAPACITY: usize = 64;

/// Miner → chain: a candidate block that has passed the PoW check and is
/// ready for validator admission.
pub type BlockFunnelSender = mpsc::Sender<Block>;
pub type BlockFunnelReceiver = mpsc::Receiver<Block>;

pub fn block_funnel() -> (BlockFunnelSender, BlockFunnelReceiver) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Chain → subscribers: a block that has just been appended.
pub type BlockPipeSender = mpsc::Sender<Block>;
pub type BlockPipeReceiver = mpsc::Receiver<Block>;

pub fn block_pipe() -> (BlockPipeSender, BlockPipeReceiver) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// External → mempool: a freshly received transaction.
pub type TxFunnelSender = mpsc::Sender<Tx>;
pub type TxFunnelReceiver = mpsc::Receiver<Tx>;

pub fn tx_funnel() -> (TxFunnelSender, TxFunnelReceiver) {
    mpsc::channel(CHANNEL_CAPACITY)
}

/// Chain → miner: "new head", used to preempt an in-flight PoW search.
#[derive(Debug, Clone)]
pub struct NewHead {
    pub block: Block,
}

pub type OutBoundEventsSender = mpsc::Sender<NewHead>;
pub type OutBoundEventsReceiver = mpsc::Receiver<NewHead>;

pub fn out_bound_events() -> (OutBoundEventsSender, OutBoundEventsReceiver) {
    mpsc::channel(CHANNEL_CAPACITY)
}
