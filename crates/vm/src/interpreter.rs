use crate::context::{CallHandle, ExecutionContext, StorageHandle};
use crate::error::VmError;
use crate::gas::{schedule, GasMeter};
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::stack::Stack;
use cerera_hash::Address;
use primitive_types::U256;
use std::collections::HashMap;

pub struct Outcome {
    pub return_data: Vec<u8>,
    pub success: bool,
    pub reverted: bool,
    pub gas_used: u64,
    pub gas_refund: u64,
    pub error: Option<VmError>,
}

pub struct Interpreter<'a> {
    code: &'a [u8],
    stack: Stack,
    memory: Memory,
    pc: usize,
    gas: GasMeter,
    return_data: Vec<u8>,
    stopped: bool,
    err: Option<VmError>,
    ctx: ExecutionContext,
    storage: &'a dyn StorageHandle,
    call_handle: &'a dyn CallHandle,
    /// Storage writes made by this frame, held back from `storage` until
    /// the run finishes without an error so a `REVERT` discards them
    /// instead of leaving a partial write behind.
    writes: HashMap<(Address, U256), U256>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        code: &'a [u8],
        ctx: ExecutionContext,
        storage: &'a dyn StorageHandle,
        call_handle: &'a dyn CallHandle,
    ) -> Self {
        let gas_limit = ctx.gas_limit;
        Interpreter {
            code,
            stack: Stack::new(),
            memory: Memory::new(),
            pc: 0,
            gas: GasMeter::new(gas_limit),
            return_data: Vec::new(),
            stopped: false,
            err: None,
            ctx,
            storage,
            call_handle,
            writes: HashMap::new(),
        }
    }

    fn is_jumpdest(&self, dest: usize) -> bool {
        dest < self.code.len()
            && Opcode::try_from(self.code[dest]) == Ok(Opcode::JumpDest)
    }

    fn push_bool(&mut self, value: bool) -> Result<(), VmError> {
        self.stack
            .push(if value { U256::one() } else { U256::zero() })
    }

    fn step(&mut self) -> Result<(), VmError> {
        let op_byte = self.code[self.pc];
        let op = Opcode::try_from(op_byte).map_err(|_| VmError::InvalidOpcode(op_byte, self.pc))?;

        self.gas.consume(schedule::BASE)?;

        if let Some(len) = op.push_immediate_len() {
            let start = self.pc + 1;
            let end = start + len;
            if end > self.code.len() {
                return Err(VmError::ExecutionError(
                    "push immediate runs past end of code".into(),
                ));
            }
            let mut bytes = [0u8; 32];
            bytes[32 - len..].copy_from_slice(&self.code[start..end]);
            self.stack.push(U256::from_big_endian(&bytes))?;
            self.pc = end;
            return Ok(());
        }

        if let Some(n) = op.dup_depth() {
            self.gas.consume(schedule::VERY_LOW)?;
            self.stack.dup(n)?;
            self.pc += 1;
            return Ok(());
        }

        if let Some(n) = op.swap_depth() {
            self.gas.consume(schedule::VERY_LOW)?;
            self.stack.swap(n)?;
            self.pc += 1;
            return Ok(());
        }

        match op {
            Opcode::Stop => {
                self.stopped = true;
            }
            Opcode::Add => {
                self.gas.consume(schedule::VERY_LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.stack.push(a.overflowing_add(b).0)?;
            }
            Opcode::Sub => {
                self.gas.consume(schedule::VERY_LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.stack.push(a.overflowing_sub(b).0)?;
            }
            Opcode::Mul => {
                self.gas.consume(schedule::LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.stack.push(a.overflowing_mul(b).0)?;
            }
            Opcode::Div => {
                self.gas.consume(schedule::LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.stack.push(a.checked_div(b).unwrap_or_default())?;
            }
            Opcode::Mod => {
                self.gas.consume(schedule::LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.stack.push(a.checked_rem(b).unwrap_or_default())?;
            }
            Opcode::Lt => {
                self.gas.consume(schedule::VERY_LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.push_bool(a < b)?;
            }
            Opcode::Gt => {
                self.gas.consume(schedule::VERY_LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.push_bool(a > b)?;
            }
            Opcode::Eq => {
                self.gas.consume(schedule::VERY_LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.push_bool(a == b)?;
            }
            Opcode::IsZero => {
                self.gas.consume(schedule::VERY_LOW)?;
                let a = self.stack.pop()?;
                self.push_bool(a.is_zero())?;
            }
            Opcode::And => {
                self.gas.consume(schedule::VERY_LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.stack.push(a & b)?;
            }
            Opcode::Or => {
                self.gas.consume(schedule::VERY_LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.stack.push(a | b)?;
            }
            Opcode::Xor => {
                self.gas.consume(schedule::VERY_LOW)?;
                let (a, b) = (self.stack.pop()?, self.stack.pop()?);
                self.stack.push(a ^ b)?;
            }
            Opcode::Not => {
                self.gas.consume(schedule::VERY_LOW)?;
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }
            Opcode::Pop => {
                self.gas.consume(schedule::BASE)?;
                self.stack.pop()?;
            }
            Opcode::Mload => {
                self.gas.consume(schedule::VERY_LOW)?;
                let offset = self.stack.pop()?.as_usize_or_err()?;
                let word = self.memory.load32(&mut self.gas, offset)?;
                self.stack.push(U256::from_big_endian(&word))?;
            }
            Opcode::Mstore => {
                self.gas.consume(schedule::VERY_LOW)?;
                let offset = self.stack.pop()?.as_usize_or_err()?;
                let value = self.stack.pop()?;
                let mut bytes = [0u8; 32];
                value.to_big_endian(&mut bytes);
                self.memory.store32(&mut self.gas, offset, bytes)?;
            }
            Opcode::Jump => {
                let dest = self.stack.pop()?.as_usize_or_err()?;
                self.gas.consume(schedule::MID)?;
                if !self.is_jumpdest(dest) {
                    return Err(VmError::InvalidJump(dest));
                }
                self.pc = dest;
                return Ok(());
            }
            Opcode::JumpI => {
                let dest = self.stack.pop()?.as_usize_or_err()?;
                let cond = self.stack.pop()?;
                self.gas.consume(schedule::HIGH)?;
                if !cond.is_zero() {
                    if !self.is_jumpdest(dest) {
                        return Err(VmError::InvalidJump(dest));
                    }
                    self.pc = dest;
                    return Ok(());
                }
            }
            Opcode::JumpDest => {
                self.gas.consume(schedule::BASE)?;
            }
            Opcode::Pc => {
                self.gas.consume(schedule::BASE)?;
                self.stack.push(U256::from(self.pc as u64))?;
            }
            Opcode::Return => {
                let offset = self.stack.pop()?.as_usize_or_err()?;
                let size = self.stack.pop()?.as_usize_or_err()?;
                self.gas.consume(schedule::BASE)?;
                self.return_data = self.memory.read(offset, size);
                self.stopped = true;
            }
            Opcode::Revert => {
                let offset = self.stack.pop()?.as_usize_or_err()?;
                let size = self.stack.pop()?.as_usize_or_err()?;
                let data = self.memory.read(offset, size);
                return Err(VmError::Revert(data));
            }
            Opcode::Address => {
                self.gas.consume(schedule::BASE)?;
                self.stack.push(address_to_u256(self.ctx.address))?;
            }
            Opcode::Caller => {
                self.gas.consume(schedule::BASE)?;
                self.stack.push(address_to_u256(self.ctx.caller))?;
            }
            Opcode::CallValue => {
                self.gas.consume(schedule::BASE)?;
                self.stack.push(U256::from(self.ctx.value))?;
            }
            Opcode::CallDataSize => {
                self.gas.consume(schedule::BASE)?;
                self.stack.push(U256::from(self.ctx.input.len() as u64))?;
            }
            Opcode::CallDataLoad => {
                self.gas.consume(schedule::VERY_LOW)?;
                let offset = self.stack.pop()?.as_usize_or_err()?;
                let word = zero_padded_window(&self.ctx.input, offset, 32);
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&word);
                self.stack.push(U256::from_big_endian(&bytes))?;
            }
            Opcode::CallDataCopy => {
                let dest_offset = self.stack.pop()?.as_usize_or_err()?;
                let offset = self.stack.pop()?.as_usize_or_err()?;
                let size = self.stack.pop()?.as_usize_or_err()?;
                self.gas.consume(schedule::VERY_LOW)?;
                let data = zero_padded_window(&self.ctx.input, offset, size);
                self.memory.write(&mut self.gas, dest_offset, &data)?;
            }
            Opcode::Sload => {
                self.gas.consume(schedule::SLOAD)?;
                let key = self.stack.pop()?;
                let value = self
                    .writes
                    .get(&(self.ctx.address, key))
                    .copied()
                    .unwrap_or_else(|| self.storage.get_storage(&self.ctx.address, key));
                self.stack.push(value)?;
            }
            Opcode::Sstore => {
                let key = self.stack.pop()?;
                let value = self.stack.pop()?;
                let old = self
                    .writes
                    .get(&(self.ctx.address, key))
                    .copied()
                    .unwrap_or_else(|| self.storage.get_storage(&self.ctx.address, key));
                let mut cost = schedule::SSTORE_BASE;
                if old.is_zero() && !value.is_zero() {
                    cost += schedule::SSTORE_SET_SURCHARGE;
                }
                self.gas.consume(cost)?;
                if !old.is_zero() && value.is_zero() {
                    self.gas.add_refund(schedule::SSTORE_CLEAR_REFUND);
                }
                self.writes.insert((self.ctx.address, key), value);
            }
            Opcode::Call => {
                self.exec_call()?;
            }
            Opcode::Push1
            | Opcode::Push2
            | Opcode::Push4
            | Opcode::Push8
            | Opcode::Push16
            | Opcode::Push32
            | Opcode::Dup1
            | Opcode::Dup2
            | Opcode::Dup3
            | Opcode::Dup4
            | Opcode::Swap1
            | Opcode::Swap2
            | Opcode::Swap3
            | Opcode::Swap4 => unreachable!("handled above"),
        }

        self.pc += 1;
        Ok(())
    }

    fn exec_call(&mut self) -> Result<(), VmError> {
        let call_gas = self.stack.pop()?.as_u64_or_err()?;
        let address = u256_to_address(self.stack.pop()?);
        let value = self.stack.pop()?.as_u128_or_err()?;
        let input_offset = self.stack.pop()?.as_usize_or_err()?;
        let input_size = self.stack.pop()?.as_usize_or_err()?;
        let output_offset = self.stack.pop()?.as_usize_or_err()?;
        let output_size = self.stack.pop()?.as_usize_or_err()?;

        let mut cost = schedule::CALL_BASE;
        if value > 0 {
            cost += schedule::CALL_VALUE_SURCHARGE;
        }
        self.gas.consume(cost)?;

        // Charge for the output window up front; the input window was
        // already paid for by whatever wrote it into memory.
        self.memory
            .write(&mut self.gas, output_offset, &vec![0u8; output_size])?;

        let input = self.memory.read(input_offset, input_size);
        let forwarded_gas = call_gas.min(self.gas.remaining());

        let (result, success, gas_used) =
            self.call_handle
                .call(self.ctx.address, address, value, &input, forwarded_gas);
        self.gas.consume(gas_used)?;

        if success {
            let copy_len = result.len().min(output_size);
            let mut window = vec![0u8; output_size];
            window[..copy_len].copy_from_slice(&result[..copy_len]);
            self.memory.write(&mut self.gas, output_offset, &window)?;
            self.push_bool(true)?;
        } else {
            let window = vec![0u8; output_size];
            self.memory.write(&mut self.gas, output_offset, &window)?;
            self.push_bool(false)?;
        }
        Ok(())
    }

    pub fn run(mut self) -> Outcome {
        loop {
            if self.stopped || self.pc >= self.code.len() {
                break;
            }
            if let Err(e) = self.step() {
                self.err = Some(e);
                break;
            }
        }

        match self.err {
            None => {
                for ((addr, key), value) in self.writes {
                    self.storage.set_storage(addr, key, value);
                }
                Outcome {
                    return_data: self.return_data,
                    success: true,
                    reverted: false,
                    gas_used: self.gas.used(),
                    gas_refund: self.gas.refund(),
                    error: None,
                }
            }
            Some(VmError::Revert(data)) => Outcome {
                return_data: data,
                success: false,
                reverted: true,
                gas_used: self.gas.used(),
                gas_refund: 0,
                error: Some(VmError::Revert(Vec::new())),
            },
            Some(err) => Outcome {
                return_data: Vec::new(),
                success: false,
                reverted: false,
                gas_used: self.gas.used(),
                gas_refund: 0,
                error: Some(err),
            },
        }
    }
}

fn address_to_u256(addr: cerera_hash::Address) -> U256 {
    let mut bytes = [0u8; 32];
    bytes[12..].copy_from_slice(addr.as_bytes());
    U256::from_big_endian(&bytes)
}

fn u256_to_address(value: U256) -> cerera_hash::Address {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    let mut out = [0u8; 20];
    out.copy_from_slice(&bytes[12..]);
    cerera_hash::Address(out)
}

fn zero_padded_window(data: &[u8], offset: usize, size: usize) -> Vec<u8> {
    let mut out = vec![0u8; size];
    if offset < data.len() {
        let avail = (data.len() - offset).min(size);
        out[..avail].copy_from_slice(&data[offset..offset + avail]);
    }
    out
}

trait U256Convert {
    fn as_usize_or_err(self) -> Result<usize, VmError>;
    fn as_u64_or_err(self) -> Result<u64, VmError>;
    fn as_u128_or_err(self) -> Result<u128, VmError>;
}

impl U256Convert for U256 {
    fn as_usize_or_err(self) -> Result<usize, VmError> {
        if self > U256::from(u32::MAX) {
            return Err(VmError::MemoryOutOfBounds);
        }
        Ok(self.as_u32() as usize)
    }

    fn as_u64_or_err(self) -> Result<u64, VmError> {
        if self > U256::from(u64::MAX) {
            return Err(VmError::ExecutionError("value does not fit in u64".into()));
        }
        Ok(self.as_u64())
    }

    fn as_u128_or_err(self) -> Result<u128, VmError> {
        if self > U256::from(u128::MAX) {
            return Err(VmError::ExecutionError(
                "value does not fit in u128".into(),
            ));
        }
        Ok(self.as_u128())
    }
}
