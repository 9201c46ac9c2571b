//! Node wiring: configuration, logging bootstrap and the `Node` context
//! that owns every component.

pub mod config;
pub mod error;
pub mod logging;
mod node;
mod services;

pub use config::{Cli, NodeConfig};
pub use error::NodeError;
pub use node::Node;
pub use services::{ChainService, MempoolService};
