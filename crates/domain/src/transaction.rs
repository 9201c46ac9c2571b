use crate::codec::{CodecError, Reader, Writer};
use cerera_hash::{rx_hash, Address, Hash};
use serde::{Deserialize, Serialize};

/// Fixed reward credited to a block's producer by its coinbase transaction.
/// Held here rather than in the miner or validator crate since both need
/// to agree on the same number.
pub const BLOCK_REWARD: u128 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxKind {
    Transfer,
    /// Producer reward, minted by the chain itself rather than submitted by
    /// a user. Never admitted through the mempool.
    Coinbase,
    /// Permissioned-network bootstrap faucet.
    Faucet,
    ContractCreate,
    ContractCall,
}

impl TxKind {
    fn tag(self) -> u8 {
        match self {
            TxKind::Transfer => 0,
            TxKind::Coinbase => 1,
            TxKind::Faucet => 2,
            TxKind::ContractCreate => 3,
            TxKind::ContractCall => 4,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, CodecError> {
        match tag {
            0 => Ok(TxKind::Transfer),
            1 => Ok(TxKind::Coinbase),
            2 => Ok(TxKind::Faucet),
            3 => Ok(TxKind::ContractCreate),
            4 => Ok(TxKind::ContractCall),
            other => Err(CodecError::InvalidEnumTag(other)),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TxError {
    #[error("contract-create transactions must have to == None")]
    CreateMustHaveNoRecipient,
    #[error("non-create transactions must specify a recipient")]
    MissingRecipient,
    #[error("contract-create transactions must carry non-empty init code")]
    EmptyInitCode,
}

/// The cryptographic key codec that would produce `signature` is out of
/// scope, so `from` is carried as an explicit field rather than recovered
/// from a signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tx {
    pub nonce: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub value: u128,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
    pub kind: TxKind,
}

impl Tx {
    pub fn new(
        nonce: u64,
        from: Address,
        to: Option<Address>,
        value: u128,
        gas_limit: u64,
        gas_price: u64,
        data: Vec<u8>,
        signature: Vec<u8>,
        kind: TxKind,
    ) -> Result<Self, TxError> {
        match kind {
            TxKind::ContractCreate => {
                if to.is_some() {
                    return Err(TxError::CreateMustHaveNoRecipient);
                }
                if data.is_empty() {
                    return Err(TxError::EmptyInitCode);
                }
            }
            TxKind::Coinbase | TxKind::Faucet | TxKind::Transfer | TxKind::ContractCall => {
                if to.is_none() {
                    return Err(TxError::MissingRecipient);
                }
            }
        }
        Ok(Tx {
            nonce,
            from,
            to,
            value,
            gas_limit,
            gas_price,
            data,
            signature,
            kind,
        })
    }

    /// Builds the coinbase transaction a miner injects at the head of every
    /// block template: `nonce = L.header.nonce`, `gas = 100`, `gas_price =
    /// 1_000_000`, `data = "COINBASE_TX"`.
    pub fn coinbase(producer: Address, prev_header_nonce: u64) -> Self {
        Tx {
            nonce: prev_header_nonce,
            from: Address::zero(),
            to: Some(producer),
            value: BLOCK_REWARD,
            gas_limit: 100,
            gas_price: 1_000_000,
            data: b"COINBASE_TX".to_vec(),
            signature: Vec::new(),
            kind: TxKind::Coinbase,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self.kind, TxKind::ContractCreate)
    }

    /// Bytes fed to `rx_hash` to derive this transaction's identity. Field
    /// order is fixed; appending new fields must only ever happen at the
    /// end so old hashes stay reproducible.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.u64(self.nonce);
        w.address(&self.from);
        w.option_address(&self.to);
        w.u128(self.value);
        w.u64(self.gas_limit);
        w.u64(self.gas_price);
        w.bytes(&self.data);
        w.bytes(&self.signature);
        w.u8(self.kind.tag());
        w.into_bytes()
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(buf);
        let nonce = r.u64()?;
        let from = r.address()?;
        let to = r.option_address()?;
        let value = r.u128()?;
        let gas_limit = r.u64()?;
        let gas_price = r.u64()?;
        let data = r.bytes()?;
        let signature = r.bytes()?;
        let kind = TxKind::from_tag(r.u8()?)?;
        r.finish()?;
        Ok(Tx {
            nonce,
            from,
            to,
            value,
            gas_limit,
            gas_price,
            data,
            signature,
            kind,
        })
    }

    pub fn hash(&self) -> Hash {
        rx_hash(&self.canonical_bytes())
    }
}
