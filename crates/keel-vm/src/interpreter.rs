//! EVM bytecode interpreter

use std::collections::HashMap;
use std::rc::Rc;

use bytes::Bytes;
use keel_crypto::keccak256;
use keel_primitives::{word, Address, Word, H256};
use keel_types::{create2_address, legacy_contract_address};
use tracing::{debug, trace};

use crate::account_state::AccountState;
use crate::arith;
use crate::context::{CallType, Env, Params};
use crate::error::{TrapKind, VmError, VmResult};
use crate::external::External;
use crate::gas::{memory_extent, Gasometer, OutOfGas, Schedule};
use crate::jumps::JumpSet;
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::result::{ExecOutcome, ExecResult};
use crate::stack::{Stack, MAX_STACK_SIZE};

/// Default limit on nested frames
pub const MAX_CALL_DEPTH: usize = 1024;

/// Transaction-scoped VM: gas schedule, block environment and the jump
/// destination cache shared by every frame.
pub struct Vm<'s> {
    schedule: &'s Schedule,
    env: &'s Env,
    max_depth: usize,
    jump_cache: HashMap<H256, Rc<JumpSet>>,
}

impl<'s> Vm<'s> {
    /// Create a VM over a schedule and block environment
    pub fn new(schedule: &'s Schedule, env: &'s Env) -> Self {
        Self {
            schedule,
            env,
            max_depth: MAX_CALL_DEPTH,
            jump_cache: HashMap::new(),
        }
    }

    /// Override the nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Gas schedule
    pub fn schedule(&self) -> &'s Schedule {
        self.schedule
    }

    /// Block environment
    pub fn env(&self) -> &'s Env {
        self.env
    }

    /// Run a top-level frame against `external`.
    ///
    /// The frame must be a message call or a creation. Traps, reverts and
    /// out-of-gas are reported in [`ExecOutcome::result`]; the pending state is
    /// empty unless the frame succeeded.
    pub fn execute(&mut self, params: Params, external: &dyn External) -> VmResult<ExecOutcome> {
        match params.call_type {
            CallType::CallCode | CallType::DelegateCall | CallType::StaticCall => {
                return Err(VmError::InvalidParams(
                    "top-level frame must be a call or a create",
                ));
            }
            CallType::Call | CallType::Create | CallType::Create2 => {}
        }
        let mut state = AccountState::new(external);
        let result = self.run_frames(params, &mut state);
        Ok(ExecOutcome {
            result,
            pending: state.into_pending(),
        })
    }

    /// Drive the frame stack until the outermost frame exits. Nested frames
    /// live on the heap, so call depth never grows the native stack.
    fn run_frames(&mut self, params: Params, state: &mut AccountState<'_>) -> ExecResult {
        let mut frames: Vec<Interpreter> = Vec::new();
        let mut entering = Some(params);
        loop {
            if let Some(params) = entering.take() {
                match self.open(params, state, frames.len()) {
                    Ok(interpreter) => frames.push(interpreter),
                    Err(result) => match frames.last_mut() {
                        Some(parent) => {
                            parent.returned = Some(result);
                            continue;
                        }
                        None => return result,
                    },
                }
            }

            let Some(frame) = frames.last_mut() else {
                return ExecResult::Stopped { gas_left: 0 };
            };
            match frame.run(self, state) {
                Exit::Enter(params) => entering = Some(params),
                Exit::Halt(result) => {
                    let Some(frame) = frames.pop() else {
                        return result;
                    };
                    let result = self.close(&frame, result, state);
                    match frames.last_mut() {
                        Some(parent) => parent.returned = Some(result),
                        None => return result,
                    }
                }
            }
        }
    }

    fn jump_set(&mut self, code: &[u8]) -> Rc<JumpSet> {
        self.jump_cache
            .entry(keccak256(code))
            .or_insert_with(|| Rc::new(JumpSet::analyze(code)))
            .clone()
    }

    /// Open a scope for a new frame. A frame that cannot start reports its
    /// trap straight back to the caller.
    fn open(
        &mut self,
        params: Params,
        state: &mut AccountState<'_>,
        depth: usize,
    ) -> Result<Interpreter, ExecResult> {
        debug!(
            depth,
            address = %params.address,
            call_type = ?params.call_type,
            gas = params.gas,
            "enter frame"
        );
        state.enter_scope();
        if let Err(kind) = prepare(&params, state) {
            state.exit_discard();
            debug!(depth, kind = %kind, "frame rejected");
            return Err(ExecResult::Trap(kind));
        }
        let jumps = self.jump_set(&params.code);
        Ok(Interpreter::new(params, jumps, depth))
    }

    /// Settle a finished frame: deposit created code, then keep or drop the
    /// frame's scope.
    fn close(&self, frame: &Interpreter, result: ExecResult, state: &mut AccountState<'_>) -> ExecResult {
        let result = if frame.params.call_type.is_create() {
            self.deposit(result, frame.params.address, state)
        } else {
            result
        };
        debug!(depth = frame.depth, result = ?result, "exit frame");
        if result.is_success() {
            state.exit_commit();
        } else {
            state.exit_discard();
        }
        result
    }

    fn deposit(&self, result: ExecResult, address: Address, state: &mut AccountState<'_>) -> ExecResult {
        match result {
            ExecResult::Done { data, gas_left } => {
                let cost = self
                    .schedule
                    .create_data_gas
                    .saturating_mul(data.len() as u64);
                if cost > gas_left {
                    return ExecResult::OutOfGas;
                }
                state.set_code(address, data.clone());
                ExecResult::Done {
                    data,
                    gas_left: gas_left - cost,
                }
            }
            other => other,
        }
    }
}

/// Collision check and value transfer before the first instruction
fn prepare(params: &Params, state: &mut AccountState<'_>) -> Result<(), TrapKind> {
    if params.call_type.is_create() && !state.code(&params.address).is_empty() {
        return Err(TrapKind::InvalidCodeAddress);
    }
    match params.call_type {
        CallType::Call | CallType::CallCode | CallType::Create | CallType::Create2 => {
            state.transfer(&params.sender, &params.address, &params.value)
        }
        CallType::DelegateCall | CallType::StaticCall => Ok(()),
    }
}

/// Why a frame stopped stepping
enum Halt {
    Stop,
    Return(Bytes),
    Revert(Bytes),
    OutOfGas,
    Trap(TrapKind),
}

impl From<TrapKind> for Halt {
    fn from(kind: TrapKind) -> Self {
        Halt::Trap(kind)
    }
}

impl From<OutOfGas> for Halt {
    fn from(_: OutOfGas) -> Self {
        Halt::OutOfGas
    }
}

type Step = Result<(), Halt>;

/// How a call to [`Interpreter::run`] ended
enum Exit {
    /// Suspended on a nested frame
    Enter(Params),
    Halt(ExecResult),
}

/// Where a suspended frame puts its nested frame's result
enum Resume {
    Call { out_offset: usize, out_size: usize },
    Create { address: Address },
}

/// Machine state of one frame
struct Interpreter {
    params: Params,
    jumps: Rc<JumpSet>,
    depth: usize,
    pc: usize,
    stack: Stack,
    memory: Memory,
    gas: Gasometer,
    return_data: Bytes,
    nested: Option<(Params, Resume)>,
    waiting: Option<Resume>,
    returned: Option<ExecResult>,
}

impl Interpreter {
    fn new(params: Params, jumps: Rc<JumpSet>, depth: usize) -> Self {
        let gas = Gasometer::new(params.gas);
        Self {
            params,
            jumps,
            depth,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            gas,
            return_data: Bytes::new(),
            nested: None,
            waiting: None,
            returned: None,
        }
    }

    /// Step until the frame halts, runs past the end of its code, or
    /// suspends on a nested call or create
    fn run(&mut self, vm: &mut Vm<'_>, state: &mut AccountState<'_>) -> Exit {
        if let Some(result) = self.returned.take() {
            if let Err(halt) = self.resume(result) {
                return Exit::Halt(self.finish(halt));
            }
        }

        let code = self.params.code.clone();
        let halt = loop {
            if self.pc >= code.len() {
                break Halt::Stop;
            }
            if let Err(halt) = self.step(vm, state, &code) {
                break halt;
            }
            if let Some((params, resume)) = self.nested.take() {
                self.waiting = Some(resume);
                return Exit::Enter(params);
            }
        };
        Exit::Halt(self.finish(halt))
    }

    fn finish(&self, halt: Halt) -> ExecResult {
        let gas_left = self.gas.gas_left();
        match halt {
            Halt::Stop => ExecResult::Stopped { gas_left },
            Halt::Return(data) => ExecResult::Done { data, gas_left },
            Halt::Revert(data) => ExecResult::Reverted { data, gas_left },
            Halt::OutOfGas => ExecResult::OutOfGas,
            Halt::Trap(kind) => ExecResult::Trap(kind),
        }
    }

    /// Take back unused gas from a nested frame and hand its result to the
    /// instruction that started it
    fn resume(&mut self, result: ExecResult) -> Step {
        self.gas.refund_unused(result.gas_left());
        match self.waiting.take() {
            Some(Resume::Call { out_offset, out_size }) => {
                let output = result.output();
                if out_size != 0 {
                    let n = out_size.min(output.len());
                    self.memory.write_slice(out_offset, &output[..n]);
                }
                self.return_data = output;
                Ok(self.stack.push_bool(result.is_success())?)
            }
            Some(Resume::Create { address }) => {
                if result.is_success() {
                    return Ok(self.stack.push(address.to_word())?);
                }
                if let ExecResult::Reverted { data, .. } = result {
                    self.return_data = data;
                }
                Ok(self.stack.push(Word::zero())?)
            }
            None => Ok(()),
        }
    }

    fn step(&mut self, vm: &mut Vm<'_>, state: &mut AccountState<'_>, code: &[u8]) -> Step {
        let schedule = vm.schedule;
        let env = vm.env;
        let opcode = Opcode(code[self.pc]);
        trace!(
            depth = self.depth,
            pc = self.pc,
            opcode = %opcode,
            gas_left = self.gas.gas_left(),
            "step"
        );

        let info = opcode.info().ok_or(TrapKind::InvalidInstruction)?;
        if self.stack.len() < info.args {
            return Err(TrapKind::StackUnderflow.into());
        }
        if self.stack.len() - info.args + info.ret > MAX_STACK_SIZE {
            return Err(TrapKind::OutOfStack.into());
        }
        if let Some(cost) = schedule.tier_gas(info.tier) {
            self.gas.consume(cost)?;
        }

        let pc = self.pc;
        self.pc += 1;

        match opcode {
            Opcode::STOP => return Err(Halt::Stop),

            // Arithmetic
            Opcode::ADD => self.binary(|a, b| a.overflowing_add(b).0)?,
            Opcode::MUL => self.binary(|a, b| a.overflowing_mul(b).0)?,
            Opcode::SUB => self.binary(|a, b| a.overflowing_sub(b).0)?,
            Opcode::DIV => self.binary(arith::div)?,
            Opcode::SDIV => self.binary(arith::sdiv)?,
            Opcode::MOD => self.binary(arith::rem)?,
            Opcode::SMOD => self.binary(arith::smod)?,
            Opcode::ADDMOD => {
                let [a, b, n] = self.stack.pop_n::<3>()?;
                self.stack.push(arith::addmod(a, b, n))?;
            }
            Opcode::MULMOD => {
                let [a, b, n] = self.stack.pop_n::<3>()?;
                self.stack.push(arith::mulmod(a, b, n))?;
            }
            Opcode::EXP => {
                let [base, exponent] = self.stack.pop_n::<2>()?;
                self.gas.consume(schedule.exp_cost(&exponent))?;
                self.stack.push(arith::exp(base, exponent))?;
            }
            Opcode::SIGNEXTEND => self.binary(arith::signextend)?,

            // Comparison and bitwise
            Opcode::LT => self.compare(|a, b| a < b)?,
            Opcode::GT => self.compare(|a, b| a > b)?,
            Opcode::SLT => self.compare(arith::slt)?,
            Opcode::SGT => self.compare(arith::sgt)?,
            Opcode::EQ => self.compare(|a, b| a == b)?,
            Opcode::ISZERO => {
                let a = self.stack.pop()?;
                self.stack.push_bool(a.is_zero())?;
            }
            Opcode::AND => self.binary(|a, b| a & b)?,
            Opcode::OR => self.binary(|a, b| a | b)?,
            Opcode::XOR => self.binary(|a, b| a ^ b)?,
            Opcode::NOT => {
                let a = self.stack.pop()?;
                self.stack.push(!a)?;
            }
            Opcode::BYTE => self.binary(arith::byte)?,
            Opcode::SHL => self.binary(arith::shl)?,
            Opcode::SHR => self.binary(arith::shr)?,
            Opcode::SAR => self.binary(arith::sar)?,

            Opcode::SHA3 => {
                let [offset, size] = self.stack.pop_n::<2>()?;
                let (offset, size) = self.touch_memory(schedule, &offset, &size)?;
                self.gas.consume(schedule.sha3_cost(size))?;
                let hash = keccak256(&self.memory.read_slice(offset, size));
                self.stack.push(Word::from_big_endian(hash.as_bytes()))?;
            }

            // Environment
            Opcode::ADDRESS => self.stack.push(self.params.address.to_word())?,
            Opcode::BALANCE => {
                let address = Address::from_word(&self.stack.pop()?);
                self.stack.push(state.balance(&address))?;
            }
            Opcode::ORIGIN => self.stack.push(self.params.origin.to_word())?,
            Opcode::CALLER => self.stack.push(self.params.sender.to_word())?,
            Opcode::CALLVALUE => self.stack.push(self.params.value)?,
            Opcode::CALLDATALOAD => {
                let offset = self.stack.pop()?;
                let mut buf = [0u8; 32];
                if let Some(offset) = word::to_usize(&offset) {
                    let data = &self.params.data;
                    if offset < data.len() {
                        let n = (data.len() - offset).min(32);
                        buf[..n].copy_from_slice(&data[offset..offset + n]);
                    }
                }
                self.stack.push(Word::from_big_endian(&buf))?;
            }
            Opcode::CALLDATASIZE => self.stack.push(Word::from(self.params.data.len() as u64))?,
            Opcode::CALLDATACOPY => {
                let [dest, offset, size] = self.stack.pop_n::<3>()?;
                let (dest, size) = self.touch_memory(schedule, &dest, &size)?;
                self.gas.consume(schedule.copy_cost(size))?;
                let offset = word::to_usize(&offset).unwrap_or(usize::MAX);
                self.memory.copy_data(dest, offset, size, &self.params.data);
            }
            Opcode::CODESIZE => self.stack.push(Word::from(code.len() as u64))?,
            Opcode::CODECOPY => {
                let [dest, offset, size] = self.stack.pop_n::<3>()?;
                let (dest, size) = self.touch_memory(schedule, &dest, &size)?;
                self.gas.consume(schedule.copy_cost(size))?;
                let offset = word::to_usize(&offset).unwrap_or(usize::MAX);
                self.memory.copy_data(dest, offset, size, code);
            }
            Opcode::GASPRICE => self.stack.push(self.params.gas_price)?,
            Opcode::EXTCODESIZE => {
                let address = Address::from_word(&self.stack.pop()?);
                self.stack.push(Word::from(state.code(&address).len() as u64))?;
            }
            Opcode::EXTCODECOPY => {
                let [address, dest, offset, size] = self.stack.pop_n::<4>()?;
                let (dest, size) = self.touch_memory(schedule, &dest, &size)?;
                self.gas.consume(schedule.copy_cost(size))?;
                let external_code = state.code(&Address::from_word(&address));
                let offset = word::to_usize(&offset).unwrap_or(usize::MAX);
                self.memory.copy_data(dest, offset, size, &external_code);
            }
            Opcode::RETURNDATASIZE => {
                self.stack.push(Word::from(self.return_data.len() as u64))?
            }
            Opcode::RETURNDATACOPY => {
                let [dest, offset, size] = self.stack.pop_n::<3>()?;
                let start = word::to_usize(&offset).ok_or(TrapKind::ReturnDataOutOfBounds)?;
                let end = word::to_usize(&size)
                    .and_then(|size| start.checked_add(size))
                    .filter(|end| *end <= self.return_data.len())
                    .ok_or(TrapKind::ReturnDataOutOfBounds)?;
                let (dest, size) = self.touch_memory(schedule, &dest, &size)?;
                self.gas.consume(schedule.copy_cost(size))?;
                self.memory
                    .write_slice(dest, &self.return_data[start..end]);
            }
            Opcode::EXTCODEHASH => {
                self.gas.consume(schedule.extcodehash_gas)?;
                let address = Address::from_word(&self.stack.pop()?);
                let external_code = state.code(&address);
                let hash = if external_code.is_empty() {
                    Word::zero()
                } else {
                    Word::from_big_endian(keccak256(&external_code).as_bytes())
                };
                self.stack.push(hash)?;
            }

            // Block
            Opcode::BLOCKHASH => {
                self.stack.pop()?;
                self.stack
                    .push(Word::from_big_endian(env.block_hash.as_bytes()))?;
            }
            Opcode::COINBASE => self.stack.push(env.coinbase.to_word())?,
            Opcode::TIMESTAMP => self.stack.push(Word::from(env.timestamp))?,
            Opcode::NUMBER => self.stack.push(Word::from(env.block_number))?,
            Opcode::DIFFICULTY => self.stack.push(env.difficulty)?,
            Opcode::GASLIMIT => self.stack.push(Word::from(env.gas_limit))?,
            Opcode::CHAINID => self.stack.push(Word::from(env.chain_id))?,
            Opcode::SELFBALANCE => self.stack.push(state.balance(&self.params.address))?,

            // Stack, memory, storage and flow
            Opcode::POP => {
                self.stack.pop()?;
            }
            Opcode::MLOAD => {
                let offset = self.stack.pop()?;
                let (offset, _) = self.touch_memory(schedule, &offset, &Word::from(32u64))?;
                self.stack.push(self.memory.read(offset))?;
            }
            Opcode::MSTORE => {
                let [offset, value] = self.stack.pop_n::<2>()?;
                let (offset, _) = self.touch_memory(schedule, &offset, &Word::from(32u64))?;
                self.memory.write(offset, &value);
            }
            Opcode::MSTORE8 => {
                let [offset, value] = self.stack.pop_n::<2>()?;
                let (offset, _) = self.touch_memory(schedule, &offset, &Word::one())?;
                self.memory.write_byte(offset, value.byte(0));
            }
            Opcode::SLOAD => {
                self.gas.consume(schedule.sload_gas)?;
                let key = self.stack.pop()?;
                self.stack.push(state.storage(&self.params.address, &key))?;
            }
            Opcode::SSTORE => {
                self.require_mutable()?;
                let [key, value] = self.stack.pop_n::<2>()?;
                let current = state.storage(&self.params.address, &key);
                let (cost, refund) = schedule.sstore_cost(&current, &value);
                self.gas.consume(cost)?;
                if refund > 0 {
                    state.add_refund(refund);
                }
                state.set_storage(self.params.address, key, value);
            }
            Opcode::JUMP => {
                let target = self.stack.pop()?;
                self.pc = self
                    .jumps
                    .verify_jump(&target)
                    .ok_or(TrapKind::InvalidJump)?;
            }
            Opcode::JUMPI => {
                let [target, condition] = self.stack.pop_n::<2>()?;
                if !condition.is_zero() {
                    self.pc = self
                        .jumps
                        .verify_jump(&target)
                        .ok_or(TrapKind::InvalidJump)?;
                }
            }
            Opcode::PC => self.stack.push(Word::from(pc as u64))?,
            Opcode::MSIZE => self.stack.push(Word::from(self.memory.len() as u64))?,
            Opcode::GAS => self.stack.push(Word::from(self.gas.gas_left()))?,
            Opcode::JUMPDEST => self.gas.consume(schedule.jumpdest_gas)?,

            // Calls and creation
            Opcode::CREATE => self.create(vm, state, CallType::Create)?,
            Opcode::CREATE2 => self.create(vm, state, CallType::Create2)?,
            Opcode::CALL => self.call(vm, state, CallType::Call)?,
            Opcode::CALLCODE => self.call(vm, state, CallType::CallCode)?,
            Opcode::DELEGATECALL => self.call(vm, state, CallType::DelegateCall)?,
            Opcode::STATICCALL => self.call(vm, state, CallType::StaticCall)?,
            Opcode::RETURN => return Err(Halt::Return(self.output_slice(schedule)?)),
            Opcode::REVERT => return Err(Halt::Revert(self.output_slice(schedule)?)),
            Opcode::SELFDESTRUCT => {
                self.require_mutable()?;
                let beneficiary = Address::from_word(&self.stack.pop()?);
                self.gas.consume(schedule.suicide_gas)?;
                let address = self.params.address;
                if !state.has_suicided(&address) {
                    state.add_refund(schedule.suicide_refund_gas);
                }
                let balance = state.balance(&address);
                if beneficiary == address {
                    if !balance.is_zero() {
                        state.set_balance(address, Word::zero());
                    }
                } else {
                    state.transfer(&address, &beneficiary, &balance)?;
                }
                state.suicide(address);
                debug!(depth = self.depth, %address, %beneficiary, "selfdestruct");
                return Err(Halt::Stop);
            }

            op if op.is_push() => {
                let n = op.push_bytes();
                let start = self.pc;
                let end = start.saturating_add(n).min(code.len());
                let mut buf = [0u8; 32];
                buf[32 - n..32 - n + (end - start)].copy_from_slice(&code[start..end]);
                self.stack.push(Word::from_big_endian(&buf))?;
                self.pc = start + n;
            }
            op if op.dup_depth() > 0 => self.stack.dup(op.dup_depth())?,
            op if op.swap_depth() > 0 => self.stack.swap(op.swap_depth())?,
            op => match op.log_topics() {
                Some(count) => self.log(schedule, state, count)?,
                None => return Err(TrapKind::InvalidInstruction.into()),
            },
        }
        Ok(())
    }

    fn binary(&mut self, f: impl FnOnce(Word, Word) -> Word) -> Step {
        let [a, b] = self.stack.pop_n::<2>()?;
        self.stack.push(f(a, b))?;
        Ok(())
    }

    fn compare(&mut self, f: impl FnOnce(Word, Word) -> bool) -> Step {
        let [a, b] = self.stack.pop_n::<2>()?;
        self.stack.push_bool(f(a, b))?;
        Ok(())
    }

    fn require_mutable(&self) -> Step {
        if self.params.is_static {
            return Err(TrapKind::MutableCallInStaticContext.into());
        }
        Ok(())
    }

    /// Charge growth to cover `extent` bytes and grow memory to match
    fn charge_extent(&mut self, schedule: &Schedule, extent: usize) -> Step {
        if extent == 0 {
            return Ok(());
        }
        let words = self
            .gas
            .charge_memory(schedule, self.memory.words(), extent)?;
        self.memory.expand(words * 32);
        Ok(())
    }

    /// Charge for the range `offset..offset + size` and return it as native
    /// offsets. A zero size touches nothing and yields `(0, 0)`.
    fn touch_memory(&mut self, schedule: &Schedule, offset: &Word, size: &Word) -> Result<(usize, usize), Halt> {
        let extent = memory_extent(offset, size)?;
        if extent == 0 {
            return Ok((0, 0));
        }
        self.charge_extent(schedule, extent)?;
        // both fit once the extent does
        Ok((offset.low_u64() as usize, size.low_u64() as usize))
    }

    fn output_slice(&mut self, schedule: &Schedule) -> Result<Bytes, Halt> {
        let [offset, size] = self.stack.pop_n::<2>()?;
        let (offset, size) = self.touch_memory(schedule, &offset, &size)?;
        Ok(Bytes::from(self.memory.read_slice(offset, size)))
    }

    fn log(&mut self, schedule: &Schedule, state: &mut AccountState<'_>, count: usize) -> Step {
        self.require_mutable()?;
        let [offset, size] = self.stack.pop_n::<2>()?;
        let mut topics = Vec::with_capacity(count);
        for _ in 0..count {
            topics.push(H256::from(self.stack.pop()?));
        }
        let (offset, size) = self.touch_memory(schedule, &offset, &size)?;
        self.gas.consume(schedule.log_cost(count, size))?;
        let data = Bytes::from(self.memory.read_slice(offset, size));
        state.add_log(self.params.address, topics, data);
        Ok(())
    }

    fn call(&mut self, vm: &mut Vm<'_>, state: &mut AccountState<'_>, call_type: CallType) -> Step {
        let schedule = vm.schedule;
        let requested = self.stack.pop()?;
        let target = Address::from_word(&self.stack.pop()?);
        let value = match call_type {
            CallType::Call | CallType::CallCode => self.stack.pop()?,
            _ => Word::zero(),
        };
        let [in_offset, in_size, out_offset, out_size] = self.stack.pop_n::<4>()?;

        if self.params.is_static && call_type == CallType::Call && !value.is_zero() {
            return Err(TrapKind::MutableCallInStaticContext.into());
        }

        let in_extent = memory_extent(&in_offset, &in_size)?;
        let out_extent = memory_extent(&out_offset, &out_size)?;
        self.charge_extent(schedule, in_extent.max(out_extent))?;

        let mut cost = schedule.call_gas;
        if !value.is_zero() {
            cost = cost.saturating_add(schedule.call_value_transfer_gas);
            if call_type == CallType::Call
                && state.code(&target).is_empty()
                && state.balance(&target).is_zero()
            {
                cost = cost.saturating_add(schedule.call_new_account_gas);
            }
        }
        self.gas.consume(cost)?;

        let forwarded = schedule.call_gas_cap(self.gas.gas_left(), &requested);
        self.gas.consume(forwarded)?;
        let stipend = if value.is_zero() { 0 } else { schedule.call_stipend };

        self.return_data = Bytes::new();
        if self.depth >= vm.max_depth || state.balance(&self.params.address) < value {
            debug!(depth = self.depth, target = %target, "call rejected");
            self.gas.refund_unused(forwarded);
            self.stack.push(Word::zero())?;
            return Ok(());
        }

        let input = if in_extent == 0 {
            Bytes::new()
        } else {
            Bytes::from(
                self.memory
                    .read_slice(in_offset.low_u64() as usize, in_size.low_u64() as usize),
            )
        };
        let (address, sender, apparent_value) = match call_type {
            CallType::CallCode => (self.params.address, self.params.address, value),
            CallType::DelegateCall => (self.params.address, self.params.sender, self.params.value),
            _ => (target, self.params.address, value),
        };
        let code = state.code(&target);
        let params = Params {
            code_address: target,
            code_hash: keccak256(&code),
            code_version: Word::zero(),
            address,
            sender,
            origin: self.params.origin,
            gas: forwarded.saturating_add(stipend),
            gas_price: self.params.gas_price,
            value: apparent_value,
            code,
            data: input,
            call_type,
            is_static: self.params.is_static || call_type == CallType::StaticCall,
        };

        debug!(depth = self.depth, target = %target, call_type = ?call_type, "call");
        let out_size = if out_extent == 0 {
            0
        } else {
            out_size.low_u64() as usize
        };
        let resume = Resume::Call {
            out_offset: out_offset.low_u64() as usize,
            out_size,
        };
        self.nested = Some((params, resume));
        Ok(())
    }

    fn create(&mut self, vm: &mut Vm<'_>, state: &mut AccountState<'_>, call_type: CallType) -> Step {
        let schedule = vm.schedule;
        self.require_mutable()?;
        let [value, offset, size] = self.stack.pop_n::<3>()?;
        let salt = if call_type == CallType::Create2 {
            self.stack.pop()?
        } else {
            Word::zero()
        };

        let (offset, size) = self.touch_memory(schedule, &offset, &size)?;
        let mut cost = schedule.create_gas;
        if call_type == CallType::Create2 {
            let words = (size as u64).div_ceil(32);
            cost = cost.saturating_add(schedule.sha3_word_gas.saturating_mul(words));
        }
        self.gas.consume(cost)?;

        let init_code = Bytes::from(self.memory.read_slice(offset, size));
        let forwarded = schedule.call_gas_cap(self.gas.gas_left(), &Word::MAX);
        self.gas.consume(forwarded)?;

        self.return_data = Bytes::new();
        let creator = self.params.address;
        if self.depth >= vm.max_depth || state.balance(&creator) < value {
            debug!(depth = self.depth, %creator, "create rejected");
            self.gas.refund_unused(forwarded);
            self.stack.push(Word::zero())?;
            return Ok(());
        }

        let address = match call_type {
            CallType::Create2 => create2_address(&creator, &salt, &init_code),
            _ => {
                let nonce = state.increment_nonce(&creator);
                legacy_contract_address(&creator, &Word::from(nonce))
            }
        };
        let params = Params {
            code_address: address,
            code_hash: keccak256(&init_code),
            code_version: Word::zero(),
            address,
            sender: creator,
            origin: self.params.origin,
            gas: forwarded,
            gas_price: self.params.gas_price,
            value,
            code: init_code,
            data: Bytes::new(),
            call_type,
            is_static: false,
        };

        debug!(depth = self.depth, %creator, %address, "create");
        self.nested = Some((params, Resume::Create { address }));
        Ok(())
    }
}
