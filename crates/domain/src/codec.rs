//! Fixed-order, fixed-width-where-possible binary codec used for the
//! canonical block/transaction bytes that feed `rx_hash`.
//!
//! JSON (via `serde`) is used for the vault file and RPC-shaped values; this
//! codec exists only so that independent nodes agree byte-for-byte on what
//! gets hashed, and so the miner's nonce field sits at a stable offset.

use cerera_hash::{Address, Hash, ADDRESS_LEN, HASH_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of buffer")]
    UnexpectedEof,
    #[error("invalid option tag {0}")]
    InvalidOptionTag(u8),
    #[error("invalid enum tag {0}")]
    InvalidEnumTag(u8),
    #[error("trailing bytes after decode")]
    TrailingBytes,
}

#[derive(Default)]
pub struct Writer(Vec<u8>);

impl Writer {
    pub fn new() -> Self {
        Writer(Vec::new())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn u8(&mut self, v: u8) {
        self.0.push(v);
    }

    pub fn u64(&mut self, v: u64) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    pub fn u128(&mut self, v: u128) {
        self.0.extend_from_slice(&v.to_be_bytes());
    }

    pub fn hash(&mut self, h: &Hash) {
        self.0.extend_from_slice(h.as_bytes());
    }

    pub fn address(&mut self, a: &Address) {
        self.0.extend_from_slice(a.as_bytes());
    }

    /// Length-prefixed (`u64` big-endian) variable-length byte string.
    pub fn bytes(&mut self, b: &[u8]) {
        self.u64(b.len() as u64);
        self.0.extend_from_slice(b);
    }

    pub fn option_address(&mut self, a: &Option<Address>) {
        match a {
            Some(addr) => {
                self.u8(1);
                self.address(addr);
            }
            None => {
                self.u8(0);
                self.0.extend_from_slice(&[0u8; ADDRESS_LEN]);
            }
        }
    }
}

pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.pos + n > self.buf.len() {
            return Err(CodecError::UnexpectedEof);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    pub fn u64(&mut self) -> Result<u64, CodecError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn u128(&mut self) -> Result<u128, CodecError> {
        let b = self.take(16)?;
        Ok(u128::from_be_bytes(b.try_into().unwrap()))
    }

    pub fn hash(&mut self) -> Result<Hash, CodecError> {
        let b = self.take(HASH_LEN)?;
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(b);
        Ok(Hash(out))
    }

    pub fn address(&mut self) -> Result<Address, CodecError> {
        let b = self.take(ADDRESS_LEN)?;
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(b);
        Ok(Address(out))
    }

    pub fn bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.u64()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    pub fn option_address(&mut self) -> Result<Option<Address>, CodecError> {
        let tag = self.u8()?;
        let addr = self.address()?;
        match tag {
            0 => Ok(None),
            1 => Ok(Some(addr)),
            other => Err(CodecError::InvalidOptionTag(other)),
        }
    }

    pub fn finish(self) -> Result<(), CodecError> {
        if self.pos != self.buf.len() {
            Err(CodecError::TrailingBytes)
        } else {
            Ok(())
        }
    }
}
