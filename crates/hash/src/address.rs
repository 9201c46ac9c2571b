use crate::{rx_hash, Hash, HASH_LEN};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ADDRESS_LEN: usize = 20;

/// Fixed-width account identifier, derived from a public key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    pub const fn zero() -> Self {
        Address([0u8; ADDRESS_LEN])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, AddressParseError> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| AddressParseError::InvalidHex)?;
        if bytes.len() != ADDRESS_LEN {
            return Err(AddressParseError::WrongLength(bytes.len()));
        }
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(&bytes);
        Ok(Address(out))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
    #[error("invalid hex string")]
    InvalidHex,
    #[error("expected {ADDRESS_LEN} bytes, got {0}")]
    WrongLength(usize),
}

impl FromStr for Address {
    type Err = AddressParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::from_hex(s)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(D::Error::custom)
    }
}

fn truncate_to_address(h: Hash) -> Address {
    let mut out = [0u8; ADDRESS_LEN];
    out.copy_from_slice(&h.as_bytes()[HASH_LEN - ADDRESS_LEN..]);
    Address(out)
}

/// Derives an account address from a raw public key.
pub fn derive_from_pubkey(pubkey: &[u8]) -> Address {
    truncate_to_address(rx_hash(pubkey))
}

/// Derives a contract address for a creation transaction: `rx_hash(sender ||
/// u64_be(nonce))` truncated to `ADDRESS_LEN`.
pub fn derive_contract_address(sender: &Address, nonce: u64) -> Address {
    let mut buf = Vec::with_capacity(ADDRESS_LEN + 8);
    buf.extend_from_slice(&sender.0);
    buf.extend_from_slice(&nonce.to_be_bytes());
    truncate_to_address(rx_hash(&buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_round_trip() {
        let a = derive_from_pubkey(b"some-public-key-bytes");
        assert_eq!(Address::from_hex(&a.to_hex()).unwrap(), a);
    }

    #[test]
    fn contract_address_is_deterministic_and_nonce_sensitive() {
        let sender = derive_from_pubkey(b"sender-key");
        let a1 = derive_contract_address(&sender, 0);
        let a2 = derive_contract_address(&sender, 0);
        let a3 = derive_contract_address(&sender, 1);
        assert_eq!(a1, a2);
        assert_ne!(a1, a3);
    }
}
