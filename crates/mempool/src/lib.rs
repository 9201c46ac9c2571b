//! Bounded, admission-controlled transaction pool (component C4).

mod error;
mod observer;
mod pool;

pub use error::MempoolError;
pub use observer::ObserverRegistry;
pub use pool::{Mempool, MempoolInfo};
