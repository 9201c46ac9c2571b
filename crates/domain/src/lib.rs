//! Canonical account, transaction and block types shared by every other
//! `cerera-*` crate.

mod account;
mod block;
mod codec;
mod transaction;

pub use account::{Account, AccountStatus};
pub use block::{Block, BlockHeader, HEADER_VERSION};
pub use codec::{CodecError, Reader, Writer};
pub use transaction::{Tx, TxError, TxKind, BLOCK_REWARD};
