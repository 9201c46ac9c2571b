use crate::codec::{CodecError, Reader, Writer};
use crate::transaction::Tx;
use cerera_hash::{rx_hash, Address, Hash};
use serde::{Deserialize, Serialize};

/// Current header layout version, bumped whenever a field is appended.
pub const HEADER_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub index: u64,
    pub height: u64,
    pub prev_hash: Hash,
    pub timestamp_ms: u64,
    pub difficulty: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub chain_id: u64,
    pub producer: Address,
    pub nonce: u64,
    /// Root of the block's transaction set: `rx_hash` of the concatenated
    /// transaction hashes in inclusion order. Not a merkle tree: proofs of
    /// inclusion are out of scope.
    pub root: Hash,
    /// Length in bytes of `Block::encode()`. Filled in once the winning
    /// nonce is known; `chain_work = Σ header.size` across the chain.
    pub size: u64,
    /// Free-form miner-supplied bytes, unused by consensus.
    pub extra: Vec<u8>,
    pub v: u8,
}

impl BlockHeader {
    /// Full field layout, used by `Block::encode`/`decode`. Every field up
    /// to and including `nonce` is fixed-width, so `nonce` always lands at
    /// the same byte offset; the miner still re-serializes on every attempt
    /// via `with_nonce` rather than splicing in place, favoring an
    /// obviously-correct implementation over a faster but easier-to-misuse
    /// one.
    fn write(&self, w: &mut Writer) {
        self.write_fields(w, self.size);
    }

    /// Same layout as `write`, but with `size` pinned to a fixed value
    /// rather than `self.size`. Used by `hash_preimage`: `size` is only
    /// known after a winning nonce is found and `header.size` is filled in,
    /// so it cannot itself be part of the bytes that hash to that nonce.
    fn write_for_hash(&self, w: &mut Writer) {
        self.write_fields(w, 0);
    }

    fn write_fields(&self, w: &mut Writer, size: u64) {
        w.u64(self.index);
        w.u64(self.height);
        w.hash(&self.prev_hash);
        w.u64(self.timestamp_ms);
        w.u64(self.difficulty);
        w.u64(self.gas_limit);
        w.u64(self.gas_used);
        w.u64(self.chain_id);
        w.address(&self.producer);
        w.u64(self.nonce);
        w.hash(&self.root);
        w.u64(size);
        w.bytes(&self.extra);
        w.u8(self.v);
    }

    fn read(r: &mut Reader) -> Result<Self, CodecError> {
        Ok(BlockHeader {
            index: r.u64()?,
            height: r.u64()?,
            prev_hash: r.hash()?,
            timestamp_ms: r.u64()?,
            difficulty: r.u64()?,
            gas_limit: r.u64()?,
            gas_used: r.u64()?,
            chain_id: r.u64()?,
            producer: r.address()?,
            nonce: r.u64()?,
            root: r.hash()?,
            size: r.u64()?,
            extra: r.bytes()?,
            v: r.u8()?,
        })
    }

    /// Returns a copy with `nonce` replaced, for the miner's search loop.
    pub fn with_nonce(&self, nonce: u64) -> Self {
        BlockHeader {
            nonce,
            ..self.clone()
        }
    }
}

/// `header` is serialized under the key `head` to match the vault file's
/// on-disk schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "head")]
    pub header: BlockHeader,
    pub transactions: Vec<Tx>,
    pub hash: Hash,
}

impl Block {
    pub fn tx_root(transactions: &[Tx]) -> Hash {
        let mut buf = Vec::new();
        for tx in transactions {
            buf.extend_from_slice(tx.hash().as_bytes());
        }
        rx_hash(&buf)
    }

    /// Bytes hashed to produce `hash`; deliberately excludes `hash` itself
    /// and `header.size`, since `size` is only filled in once the winning
    /// nonce (and therefore the hash) is already known.
    pub fn hash_preimage(header: &BlockHeader, transactions: &[Tx]) -> Vec<u8> {
        let mut w = Writer::new();
        header.write_for_hash(&mut w);
        w.u64(transactions.len() as u64);
        for tx in transactions {
            w.bytes(&tx.canonical_bytes());
        }
        w.into_bytes()
    }

    pub fn seal(header: BlockHeader, transactions: Vec<Tx>) -> Self {
        let hash = rx_hash(&Self::hash_preimage(&header, &transactions));
        Block {
            header,
            transactions,
            hash,
        }
    }

    /// Full binary encoding, including `hash`, used for the byte-exact
    /// round-trip property and as the basis for `header.size`. The vault
    /// file format itself is JSON; this codec is only for hashing and this
    /// round trip.
    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.header.write(&mut w);
        w.u64(self.transactions.len() as u64);
        for tx in &self.transactions {
            w.bytes(&tx.canonical_bytes());
        }
        w.hash(&self.hash);
        w.into_bytes()
    }

    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(buf);
        let header = BlockHeader::read(&mut r)?;
        let tx_count = r.u64()? as usize;
        let mut transactions = Vec::with_capacity(tx_count);
        for _ in 0..tx_count {
            let tx_bytes = r.bytes()?;
            transactions.push(Tx::decode(&tx_bytes)?);
        }
        let hash = r.hash()?;
        r.finish()?;
        Ok(Block {
            header,
            transactions,
            hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TxKind;

    fn header() -> BlockHeader {
        BlockHeader {
            index: 1,
            height: 1,
            prev_hash: Hash::zero(),
            timestamp_ms: 1_000,
            difficulty: 4,
            gas_limit: 8_000_000,
            gas_used: 0,
            chain_id: 7,
            producer: Address::zero(),
            nonce: 0,
            root: Hash::zero(),
            size: 0,
            extra: Vec::new(),
            v: HEADER_VERSION,
        }
    }

    #[test]
    fn with_nonce_changes_only_the_nonce() {
        let h = header();
        let h2 = h.with_nonce(42);
        assert_eq!(h2.nonce, 42);
        assert_eq!(h2.index, h.index);
    }

    #[test]
    fn seal_is_deterministic_and_nonce_sensitive() {
        let txs = vec![Tx::coinbase(Address::zero(), 1)];
        let b1 = Block::seal(header(), txs.clone());
        let b2 = Block::seal(header(), txs.clone());
        assert_eq!(b1.hash, b2.hash);

        let b3 = Block::seal(header().with_nonce(1), txs);
        assert_ne!(b1.hash, b3.hash);
    }

    #[test]
    fn block_round_trips_through_codec() {
        let txs = vec![Tx::coinbase(Address::zero(), 1)];
        let block = Block::seal(header(), txs);
        let decoded = Block::decode(&block.encode()).unwrap();
        assert_eq!(block, decoded);
    }

    #[test]
    fn tx_root_changes_with_transaction_set() {
        let a = Block::tx_root(&[Tx::coinbase(Address::zero(), 1)]);
        let b = Block::tx_root(&[Tx::coinbase(Address::zero(), 2)]);
        assert_ne!(a, b);
        let _ = TxKind::Transfer;
    }
}
