/// Failure classes surfaced by the miner itself (as opposed to failures the
/// validator reports back through `propose_block`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MinerError {
    /// A difficulty of zero would make `target = 2^256/difficulty`
    /// undefined; the template is rejected rather than dividing by zero.
    #[error("template difficulty must be non-zero")]
    DifficultyZero,
}
