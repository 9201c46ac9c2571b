//! Stack + linear-memory + gas-metered contract interpreter (component C3).

mod context;
mod error;
mod gas;
mod interpreter;
mod memory;
mod opcode;
mod stack;

pub use context::{BlockInfo, CallHandle, ExecutionContext, StorageHandle};
pub use error::VmError;
pub use gas::{schedule, GasMeter};
pub use interpreter::{Interpreter, Outcome};
pub use memory::{Memory, MEMORY_LIMIT};
pub use opcode::Opcode;
pub use stack::{Stack, STACK_LIMIT};

use cerera_hash::{derive_contract_address, Address};
use cerera_vault::Vault;
use primitive_types::U256;

/// Calls made while already inside a contract recurse through here, so a
/// runaway cycle of contracts calling each other can't blow the host stack.
pub const CALL_DEPTH_LIMIT: usize = 1024;

impl StorageHandle for Vault {
    fn get_storage(&self, address: &Address, key: U256) -> U256 {
        Vault::get_storage(self, address, key)
    }

    fn set_storage(&self, address: Address, key: U256, value: U256) {
        Vault::set_storage(self, address, key, value)
    }
}

struct VaultCallHandle<'a> {
    vault: &'a Vault,
    block: BlockInfo,
    depth: usize,
}

impl<'a> CallHandle for VaultCallHandle<'a> {
    fn call(
        &self,
        caller: Address,
        address: Address,
        value: u128,
        input: &[u8],
        gas_limit: u64,
    ) -> (Vec<u8>, bool, u64) {
        if self.depth >= CALL_DEPTH_LIMIT {
            return (Vec::new(), false, 0);
        }
        if value > 0 && self.vault.update_balance(caller, address, value, cerera_hash::Hash::zero()).is_err() {
            return (Vec::new(), false, 0);
        }
        if !self.vault.has_code(&address) {
            return (Vec::new(), true, 0);
        }

        let code = self.vault.get_code(&address);
        let ctx = ExecutionContext {
            caller,
            address,
            value,
            input: input.to_vec(),
            gas_limit,
            gas_price: 0,
            block: self.block,
        };
        let sub_handle = VaultCallHandle {
            vault: self.vault,
            block: self.block,
            depth: self.depth + 1,
        };
        let outcome = Interpreter::new(&code, ctx, self.vault, &sub_handle).run();
        (outcome.return_data, outcome.success, outcome.gas_used)
    }
}

pub struct CreationOutcome {
    pub contract_address: Address,
    pub success: bool,
    pub return_data: Vec<u8>,
    pub gas_used: u64,
    pub error: Option<VmError>,
}

pub struct CallOutcome {
    pub success: bool,
    pub return_data: Vec<u8>,
    pub gas_used: u64,
    pub error: Option<VmError>,
}

/// Runs a contract-creation invocation: `tx.data` is init code, the
/// contract address is derived from `(sender, sender.nonce)`, and code is
/// provisionally stored before the init code runs.
pub fn execute_creation(
    sender: Address,
    sender_nonce: u64,
    init_code: &[u8],
    value: u128,
    gas_limit: u64,
    vault: &Vault,
    block: BlockInfo,
) -> CreationOutcome {
    let contract_address = derive_contract_address(&sender, sender_nonce);
    vault.store_code(contract_address, init_code.to_vec());

    let ctx = ExecutionContext {
        caller: sender,
        address: contract_address,
        value,
        input: Vec::new(),
        gas_limit,
        gas_price: 0,
        block,
    };
    let call_handle = VaultCallHandle {
        vault,
        block,
        depth: 0,
    };
    let outcome = Interpreter::new(init_code, ctx, vault, &call_handle).run();

    match &outcome.error {
        None => {
            if !outcome.return_data.is_empty() {
                vault.store_code(contract_address, outcome.return_data.clone());
            }
            CreationOutcome {
                contract_address,
                success: true,
                return_data: outcome.return_data,
                gas_used: outcome.gas_used,
                error: None,
            }
        }
        Some(VmError::OutOfGas) | Some(VmError::Revert(_)) => {
            vault.delete_code(&contract_address);
            CreationOutcome {
                contract_address,
                success: false,
                return_data: outcome.return_data,
                gas_used: outcome.gas_used,
                error: outcome.error,
            }
        }
        Some(_) => {
            // Other failure classes leave the provisional code in place,
            // matching EVM creation-failure behavior.
            CreationOutcome {
                contract_address,
                success: false,
                return_data: Vec::new(),
                gas_used: outcome.gas_used,
                error: outcome.error,
            }
        }
    }
}

/// Runs a contract-call invocation against code already stored at
/// `contract`. Fails with `ContractNotFound` if none is present.
pub fn execute_call(
    sender: Address,
    contract: Address,
    input: &[u8],
    value: u128,
    gas_limit: u64,
    vault: &Vault,
    block: BlockInfo,
) -> CallOutcome {
    if !vault.has_code(&contract) {
        return CallOutcome {
            success: false,
            return_data: Vec::new(),
            gas_used: 0,
            error: Some(VmError::ContractNotFound),
        };
    }
    let code = vault.get_code(&contract);
    let ctx = ExecutionContext {
        caller: sender,
        address: contract,
        value,
        input: input.to_vec(),
        gas_limit,
        gas_price: 0,
        block,
    };
    let call_handle = VaultCallHandle {
        vault,
        block,
        depth: 0,
    };
    let outcome = Interpreter::new(&code, ctx, vault, &call_handle).run();
    CallOutcome {
        success: outcome.error.is_none(),
        return_data: outcome.return_data,
        gas_used: outcome.gas_used,
        error: outcome.error,
    }
}
