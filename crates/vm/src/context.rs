use cerera_hash::Address;

/// Block-level facts exposed to running bytecode. A narrower view than the
/// full chain header so contracts can't reach for anything beyond what's
/// explicitly exposed.
#[derive(Debug, Clone, Copy)]
pub struct BlockInfo {
    pub index: u64,
    pub producer: Address,
    pub difficulty: u64,
    pub gas_limit: u64,
    pub timestamp_ms: u64,
    pub chain_id: u64,
}

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub caller: Address,
    pub address: Address,
    pub value: u128,
    pub input: Vec<u8>,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub block: BlockInfo,
}

/// Capability handle for the `CALL` opcode. A back-reference to whatever
/// orchestrates cross-contract dispatch, held without owning it:
/// back-references like this are capability handles, never
/// lifetime-owning.
pub trait CallHandle {
    /// Dispatches a message call and returns `(return_data, success,
    /// gas_used)`.
    fn call(
        &self,
        caller: Address,
        address: Address,
        value: u128,
        input: &[u8],
        gas_limit: u64,
    ) -> (Vec<u8>, bool, u64);
}

/// Capability handle over contract storage, keyed the same way the vault
/// keys it: `(address, 256-bit key) -> 256-bit value`.
pub trait StorageHandle {
    fn get_storage(&self, address: &Address, key: primitive_types::U256) -> primitive_types::U256;
    fn set_storage(&self, address: Address, key: primitive_types::U256, value: primitive_types::U256);
}
