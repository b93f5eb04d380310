// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::coroutine::Suspender;
use crate::{
    block_context::BlockContext,
    builtin::Builtin,
    error::ExecutorError,
    precompiled::{
        PrecompiledExecResult, PrecompiledParams, PrecompiledRegistry,
        AUTH_MANAGER_ADDRESS,
    },
    storage::{
        contract_table_name, Entry, StorageWrapper, ACCOUNT_ABI,
        ACCOUNT_CODE, ACCOUNT_CODE_HASH, STORAGE_VALUE,
    },
    substate::Substate,
    vm::{
        has_wasm_preamble, DelegateInfo, GasInjector, Host, VmFactory, VmKind,
    },
};
use basalt_vm_types::{
    vm_status, CallKind, CallMessage, GasSchedule, Hasher,
    InterpreterCallKind, InterpreterMessage, TransactionStatus, VmError,
    VmExecResult, VmResult,
};
use rustc_hex::ToHex;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Weak},
};

/// Outcome of preparing a call: either it short-circuited into a final
/// message, or a frame is ready to run under an interpreter.
enum Prepared {
    Done(CallMessage),
    Run(Frame),
}

/// A call that has been resolved to a storage table and is ready for the
/// interpreter.
struct Frame {
    message: CallMessage,
    table: String,
    /// Companion message threaded through WASM creation; carries the
    /// interface descriptor and the constructor input.
    extra: Option<CallMessage>,
    delegate: Option<DelegateInfo>,
}

/// Runs one transaction's calls against the block state. Constructed
/// inside its coroutine thread and driven from outside through
/// [`super::ExecutiveState`]; single-use.
pub struct TransactionExecutive {
    block_context: Weak<BlockContext>,
    context_id: i64,
    seq: i64,
    /// Contract currently executing.
    contract_address: String,
    is_wasm: bool,
    is_auth_check: bool,
    block_number: u64,
    storage: StorageWrapper,
    hasher: Arc<dyn Hasher>,
    /// Key locks this transaction currently holds.
    key_locks: BTreeSet<String>,
    precompiled: Arc<PrecompiledRegistry>,
    builtins: Arc<BTreeMap<String, Builtin>>,
    vm_factory: Arc<VmFactory>,
    gas_injector: GasInjector,
    suspender: Suspender,
}

impl TransactionExecutive {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        block_context: &Arc<BlockContext>, contract_address: String,
        context_id: i64, seq: i64, precompiled: Arc<PrecompiledRegistry>,
        builtins: Arc<BTreeMap<String, Builtin>>,
        vm_factory: Arc<VmFactory>, suspender: Suspender,
    ) -> TransactionExecutive {
        TransactionExecutive {
            block_context: Arc::downgrade(block_context),
            context_id,
            seq,
            contract_address,
            is_wasm: block_context.is_wasm,
            is_auth_check: block_context.is_auth_check,
            block_number: block_context.number,
            storage: StorageWrapper::new(block_context.storage().clone()),
            hasher: block_context.hasher().clone(),
            key_locks: BTreeSet::new(),
            precompiled,
            builtins,
            vm_factory,
            gas_injector: GasInjector,
            suspender,
        }
    }

    pub fn context_id(&self) -> i64 { self.context_id }

    pub fn seq(&self) -> i64 { self.seq }

    pub fn contract_address(&self) -> &str { &self.contract_address }

    pub fn is_wasm(&self) -> bool { self.is_wasm }

    pub fn storage(&self) -> &StorageWrapper { &self.storage }

    pub fn storage_mut(&mut self) -> &mut StorageWrapper { &mut self.storage }

    /// Read-only snapshot of the state as of the previous committed
    /// version, unaffected by this block's uncommitted writes. Used by
    /// authorization lookups.
    pub fn prior_storage(&self) -> Option<Arc<dyn crate::storage::Storage>> {
        self.block_context
            .upgrade()
            .and_then(|context| context.prior_storage.clone())
    }

    pub fn key_locks(&self) -> &BTreeSet<String> { &self.key_locks }

    pub fn is_precompiled(&self, address: &str) -> bool {
        self.precompiled.contains(address)
    }

    pub fn is_evm_builtin(&self, address: &str) -> bool {
        self.builtins.contains_key(address)
    }

    pub(crate) fn evm_builtins(&self) -> Arc<BTreeMap<String, Builtin>> {
        self.builtins.clone()
    }

    /// Runs a registered precompiled contract. Precompiled code may call
    /// back into this executive, so the handle is handed through.
    pub fn run_precompiled(
        &mut self, address: &str, params: PrecompiledParams,
    ) -> VmResult<PrecompiledExecResult> {
        let contract = self.precompiled.get(address).ok_or_else(|| {
            VmError::PrecompiledFailure(format!(
                "no precompiled contract at {}",
                address
            ))
        })?;
        contract.call(self, params)
    }

    /// Entry point, called once from the coroutine thread.
    pub(super) fn start(
        &mut self, mut input: CallMessage,
    ) -> Result<CallMessage, ExecutorError> {
        trace!(
            "execute start: context_id={} seq={} to={} create={}",
            input.context_id,
            input.seq,
            input.receiver,
            input.create
        );
        // locks granted ahead of this run arrive with the input
        self.key_locks.append(&mut input.key_locks);
        let output = self.execute(input)?;
        trace!(
            "execute finish: context_id={} status={} gas={}",
            output.context_id,
            output.status,
            output.gas
        );
        Ok(output)
    }

    /// Core dispatch between contract creation and message calls.
    fn execute(
        &mut self, call: CallMessage,
    ) -> Result<CallMessage, ExecutorError> {
        let prepared = if call.create {
            self.create(call)?
        } else {
            self.call(call)?
        };
        match prepared {
            Prepared::Done(message) => Ok(message),
            Prepared::Run(frame) => self.go(frame),
        }
    }

    /// Contract creation: validates WASM bytecode, claims the contract's
    /// storage table, and injects gas metering before anything runs.
    fn create(
        &mut self, mut call: CallMessage,
    ) -> Result<Prepared, ExecutorError> {
        let table = contract_table_name(&call.code_address, self.is_wasm);
        let mut extra = CallMessage::new(CallKind::Message);
        extra.abi = std::mem::take(&mut call.abi);
        debug!(
            "executive deploy contract: table={} sender={} abi_len={}",
            table,
            call.sender,
            extra.abi.len()
        );

        if self.is_auth_check && !self.check_auth(&mut call) {
            self.revert();
            return Ok(Prepared::Done(call));
        }

        if self.is_wasm && !has_wasm_preamble(&call.data) {
            self.revert();
            info!("Revert transaction: the code is not wasm bytecode");
            return Ok(Prepared::Done(reject(
                call,
                TransactionStatus::WasmValidationFailure,
                "the code is not wasm bytecode",
            )));
        }

        match self.storage.create_table(&table, STORAGE_VALUE) {
            Ok(_) => {
                info!(
                    "create contract table: table={} sender={}",
                    table, call.sender
                );
            }
            Err(err) => {
                self.revert();
                info!("Revert transaction: create table failed: {}", err);
                return Ok(Prepared::Done(reject(
                    call,
                    TransactionStatus::ContractAddressAlreadyUsed,
                    "Contract address already used.",
                )));
            }
        }

        if self.is_wasm {
            match self.gas_injector.inject(&call.data) {
                Ok(metered) => call.data = metered,
                Err(err) => {
                    self.revert();
                    warn!("Revert transaction: {}", err);
                    return Ok(Prepared::Done(reject(
                        call,
                        TransactionStatus::WasmValidationFailure,
                        "wasm bytecode invalid or use unsupported opcode",
                    )));
                }
            }
        }

        Ok(Prepared::Run(Frame {
            message: call,
            table,
            extra: Some(extra),
            delegate: None,
        }))
    }

    /// Message call: resolves the destination, short-circuits precompiled
    /// addresses, and otherwise prepares a frame bound to the
    /// destination's table.
    fn call(
        &mut self, mut call: CallMessage,
    ) -> Result<Prepared, ExecutorError> {
        debug!(
            "executive call: contract={} sender={} delegate={}",
            call.receiver, call.sender, call.delegate_call
        );
        let table = contract_table_name(&call.receiver, self.is_wasm);

        if call.delegate_call {
            // borrowed code was resolved on the caller's side; no
            // permission check here, the caller's frame was already vetted
            return match call.delegate_call_code.take() {
                Some(code) => {
                    let sender = call.delegate_call_sender.clone();
                    Ok(Prepared::Run(Frame {
                        message: call,
                        table,
                        extra: None,
                        delegate: Some(DelegateInfo { code, sender }),
                    }))
                }
                None => {
                    self.revert();
                    debug!("Revert transaction: delegate call without code");
                    Ok(Prepared::Done(reject(
                        call,
                        TransactionStatus::RevertInstruction,
                        "missing code for delegate call",
                    )))
                }
            };
        }

        if self.is_auth_check && !self.check_auth(&mut call) {
            self.revert();
            return Ok(Prepared::Done(call));
        }

        if self.precompiled.contains(&call.receiver) {
            return Ok(Prepared::Done(self.call_precompiled(call)?));
        }

        Ok(Prepared::Run(Frame {
            message: call,
            table,
            extra: None,
            delegate: None,
        }))
    }

    /// Dispatches to the precompiled collaborator, folding its gas use and
    /// failures into the message.
    fn call_precompiled(
        &mut self, mut call: CallMessage,
    ) -> Result<CallMessage, ExecutorError> {
        let params = PrecompiledParams {
            input: call.data.clone(),
            origin: call.origin.clone(),
            sender: call.sender.clone(),
            gas_left: call.gas,
        };
        let address = call.receiver.clone();
        match self.run_precompiled(&address, params) {
            Ok(result) if result.gas_left < 0 => {
                self.revert();
                info!("Revert transaction: call precompiled out of gas");
                call = reject(
                    call,
                    TransactionStatus::OutOfGas,
                    "Call precompiled out of gas.",
                );
            }
            Ok(result) => {
                call.kind = CallKind::Finished;
                call.status = TransactionStatus::None;
                call.vm_status = vm_status::SUCCESS;
                call.gas = result.gas_left;
                call.data = result.output;
            }
            Err(VmError::DeadLock(key)) => {
                self.revert();
                debug!(
                    "Revert by dead lock, sender: {} receiver: {}",
                    call.sender, call.receiver
                );
                call = reject(
                    call,
                    TransactionStatus::DeadLock,
                    &format!("dead lock on key {}", key),
                );
            }
            Err(VmError::PrecompiledFailure(text)) => {
                self.revert();
                info!("Revert transaction: PrecompiledError: {}", text);
                call =
                    reject(call, TransactionStatus::PrecompiledError, &text);
            }
            Err(err) => {
                self.revert();
                warn!("Revert transaction: precompiled failure: {}", err);
                call = reject(
                    call,
                    TransactionStatus::Unknown,
                    &err.to_string(),
                );
            }
        }
        Ok(call)
    }

    /// Runs a prepared frame under a freshly built interpreter instance
    /// and folds the result into the outgoing message.
    fn go(&mut self, frame: Frame) -> Result<CallMessage, ExecutorError> {
        let block_context = self
            .block_context
            .upgrade()
            .ok_or(ExecutorError::BlockContextDropped)?;
        let Frame {
            mut message,
            table,
            extra,
            delegate,
        } = frame;
        self.contract_address = message.receiver.clone();
        let revision = block_context.revision();
        let schedule = block_context.schedule.clone();

        if message.create {
            let code = std::mem::take(&mut message.data);
            let (extra_input, extra_abi) = match extra {
                Some(extra) => (extra.data, extra.abi),
                None => (Vec::new(), String::new()),
            };
            let kind = if self.is_wasm { VmKind::Wasm } else { VmKind::Evm };
            let mut vm = self
                .vm_factory
                .create(kind)
                .ok_or(ExecutorError::NoEngine(kind))?;
            let imsg = InterpreterMessage {
                kind: InterpreterCallKind::Create,
                is_static: false,
                gas: message.gas,
                sender: message.sender.clone(),
                destination: message.receiver.clone(),
                input: extra_input,
                create_salt: message.create_salt,
            };
            let (result, out, substate) = {
                let mut host = Host::new(
                    self,
                    block_context.clone(),
                    message,
                    table.clone(),
                    None,
                );
                let result = vm.execute(&mut host, revision, &imsg, &code);
                let (out, substate) = host.into_parts();
                (result, out, substate)
            };
            let mut out = self.parse_vm_result(out, &result)?;
            if out.status != TransactionStatus::None {
                info!(
                    "Revert transaction: deploy failed due to status error: \
                     status={} sender={} address={}",
                    out.status, out.sender, out.code_address
                );
                out.kind = CallKind::Revert;
                out.create = false;
                return Ok(out);
            }

            let output = result.output;
            if output.len() > schedule.max_code_size {
                self.revert();
                let text = format!(
                    "Code is too large: {} limit: {}",
                    output.len(),
                    schedule.max_code_size
                );
                debug!("Revert transaction: deploy failed: {}", text);
                return Ok(reject(out, TransactionStatus::OutOfGas, &text));
            }

            let deposit = output.len() as i64 * schedule.create_data_gas;
            if deposit > out.gas && schedule.exceptional_failed_code_deposit {
                self.revert();
                info!(
                    "Revert transaction: deploy failed: \
                     exceptional failed code deposit"
                );
                return Ok(reject(
                    out,
                    TransactionStatus::OutOfGas,
                    "exceptionalFailedCodeDeposit",
                ));
            }

            if !self.is_wasm && output.is_empty() {
                self.revert();
                warn!("Revert transaction: deploy produced empty code");
                let mut out = reject(
                    out,
                    TransactionStatus::Unknown,
                    "Create contract with empty code, wrong code input.",
                );
                out.create = false;
                return Ok(out);
            }

            self.set_code(&table, output)?;
            if self.is_wasm {
                self.set_abi(&table, &extra_abi)?;
            }

            self.trace_refunds(&schedule, &substate);
            out.gas -= deposit;
            out.new_contract_address = out.code_address.clone();
            out.create = false;
            out.data.clear();
            out.log_entries = substate.logs;
            Ok(out)
        } else {
            let code = match &delegate {
                Some(info) => Some(info.code.clone()),
                None => self
                    .storage
                    .get_row(&table, ACCOUNT_CODE)
                    .map(|entry| entry.value),
            };
            let code = match code {
                Some(code) if !code.is_empty() => code,
                _ => {
                    self.revert();
                    info!(
                        "Revert transaction: call address error, maybe \
                         address does not exist: address={} sender={}",
                        message.receiver, message.sender
                    );
                    return Ok(reject(
                        message,
                        TransactionStatus::CallAddressError,
                        "Error contract address.",
                    ));
                }
            };
            let kind = VmKind::select(&code);
            let mut vm = self
                .vm_factory
                .create(kind)
                .ok_or(ExecutorError::NoEngine(kind))?;
            let imsg = InterpreterMessage {
                kind: InterpreterCallKind::Call,
                is_static: message.static_call,
                gas: message.gas,
                sender: message.sender.clone(),
                destination: message.receiver.clone(),
                input: message.data.clone(),
                create_salt: None,
            };
            let (result, out, substate) = {
                let mut host = Host::new(
                    self,
                    block_context.clone(),
                    message,
                    table.clone(),
                    delegate,
                );
                let result = vm.execute(&mut host, revision, &imsg, &code);
                let (out, substate) = host.into_parts();
                (result, out, substate)
            };
            let mut out = self.parse_vm_result(out, &result)?;
            if out.kind == CallKind::Finished {
                self.trace_refunds(&schedule, &substate);
                out.log_entries = substate.logs;
            }
            Ok(out)
        }
    }

    /// The single point where interpreter status codes become the domain
    /// taxonomy. Statuses at or below the internal threshold mark a defect
    /// in the interpreter or this bridge; continuing could commit corrupt
    /// state to the ledger, so the process terminates instead.
    fn parse_vm_result(
        &mut self, mut out: CallMessage, result: &VmExecResult,
    ) -> Result<CallMessage, ExecutorError> {
        out.kind = CallKind::Revert;
        out.vm_status = result.status;
        match result.status {
            vm_status::SUCCESS => {
                out.kind = CallKind::Finished;
                out.status = TransactionStatus::None;
                out.gas = result.gas_left;
                if !out.create {
                    out.data = result.output.clone();
                }
            }
            vm_status::REVERT => {
                info!(
                    "Revert transaction: revert instruction: to={} gas={}",
                    out.receiver, result.gas_left
                );
                out.gas = result.gas_left;
                self.revert();
                // precompiled and contract code both write the failure
                // reason into the output on revert
                out.data = result.output.clone();
                out.status = TransactionStatus::RevertInstruction;
            }
            vm_status::OUT_OF_GAS => {
                self.revert();
                info!(
                    "Revert transaction: OutOfGas: to={} gas={}",
                    out.receiver, result.gas_left
                );
                out.gas = result.gas_left;
                set_failure(
                    &mut out,
                    TransactionStatus::OutOfGas,
                    "Execution out of gas.",
                );
            }
            vm_status::FAILURE => {
                self.revert();
                info!("Revert transaction: WASMTrap: to={}", out.receiver);
                out.gas = result.gas_left;
                set_failure(
                    &mut out,
                    TransactionStatus::WasmTrap,
                    "Execution failure.",
                );
            }
            vm_status::INVALID_INSTRUCTION
            | vm_status::UNDEFINED_INSTRUCTION => {
                self.revert();
                info!(
                    "Revert transaction: invalid/undefined instruction: \
                     to={}",
                    out.receiver
                );
                set_failure(
                    &mut out,
                    TransactionStatus::BadInstruction,
                    "Execution invalid/undefined opcode.",
                );
            }
            vm_status::BAD_JUMP_DESTINATION => {
                self.revert();
                info!(
                    "Revert transaction: bad jump destination: to={}",
                    out.receiver
                );
                set_failure(
                    &mut out,
                    TransactionStatus::BadJumpDestination,
                    "Execution has violated the jump destination \
                     restrictions.",
                );
            }
            vm_status::STACK_OVERFLOW => {
                self.revert();
                info!(
                    "Revert transaction: stack overflow: to={}",
                    out.receiver
                );
                set_failure(
                    &mut out,
                    TransactionStatus::OutOfStack,
                    "Execution stack overflow.",
                );
            }
            vm_status::STACK_UNDERFLOW
            | vm_status::INVALID_MEMORY_ACCESS => {
                self.revert();
                info!(
                    "Revert transaction: stack underflow or bad memory \
                     access: to={}",
                    out.receiver
                );
                set_failure(
                    &mut out,
                    TransactionStatus::StackUnderflow,
                    "Execution needs more items on EVM stack.",
                );
            }
            vm_status::STATIC_MODE_VIOLATION => {
                self.revert();
                info!(
                    "Revert transaction: disallowed state change: to={}",
                    out.receiver
                );
                set_failure(
                    &mut out,
                    TransactionStatus::Unknown,
                    "Execution tried to execute an operation which is \
                     restricted in static mode.",
                );
            }
            vm_status::PRECOMPILE_FAILURE => {
                self.revert();
                info!(
                    "Revert transaction: precompiled failure: to={}",
                    out.receiver
                );
                set_failure(
                    &mut out,
                    TransactionStatus::PrecompiledError,
                    "Precompiled contract has failed.",
                );
            }
            vm_status::CONTRACT_VALIDATION_FAILURE => {
                self.revert();
                info!(
                    "Revert transaction: wasm validation failed: to={}",
                    out.receiver
                );
                set_failure(
                    &mut out,
                    TransactionStatus::WasmValidationFailure,
                    "Contract validation has failed.",
                );
            }
            vm_status::ARGUMENT_OUT_OF_RANGE => {
                self.revert();
                info!(
                    "Revert transaction: wasm argument out of range: to={}",
                    out.receiver
                );
                set_failure(
                    &mut out,
                    TransactionStatus::WasmArgumentOutOfRange,
                    "An argument to a state accessing method has a value \
                     outside of the accepted range of values.",
                );
            }
            vm_status::WASM_TRAP
            | vm_status::WASM_UNREACHABLE_INSTRUCTION => {
                self.revert();
                info!(
                    "Revert transaction: wasm unreachable/trap: to={} \
                     status={}",
                    out.receiver, result.status
                );
                set_failure(
                    &mut out,
                    TransactionStatus::WasmUnreachableInstruction,
                    "A WebAssembly trap has been hit during execution.",
                );
            }
            status => {
                self.revert();
                if status <= vm_status::INTERNAL_ERROR {
                    error!(
                        "Internal interpreter error ({}), refusing to \
                         continue with possibly corrupted state",
                        status
                    );
                    std::process::abort();
                }
                // more specific codes some interpreters return; all of
                // them fold into out-of-gas
                warn!(
                    "Revert transaction: unmapped interpreter status {}: \
                     to={}",
                    status, out.receiver
                );
                out.status = TransactionStatus::OutOfGas;
            }
        }
        Ok(out)
    }

    /// Issues a nested call through the external scheduler. Exports the
    /// held key locks with the request and imports the locks granted while
    /// the nested call ran.
    pub fn external_call(&mut self, mut request: CallMessage) -> CallMessage {
        self.seq += 1;
        request.kind = CallKind::Message;
        request.context_id = self.context_id;
        request.seq = self.seq;
        request.key_locks = self.key_locks.clone();

        if request.create && !self.is_wasm && request.receiver.is_empty() {
            let address = self.next_contract_address(&request);
            request.receiver = address.clone();
            request.code_address = address;
        }

        if request.delegate_call && request.delegate_call_code.is_none() {
            let table =
                contract_table_name(&request.code_address, self.is_wasm);
            match self.storage.get_row(&table, ACCOUNT_CODE) {
                Some(entry) if !entry.value.is_empty() => {
                    request.delegate_call_code = Some(entry.value);
                }
                _ => {
                    debug!(
                        "could not get code for delegate call: \
                         code_address={}",
                        request.code_address
                    );
                    request.kind = CallKind::Revert;
                    request.status = TransactionStatus::RevertInstruction;
                    request.vm_status = vm_status::REVERT;
                    request.data.clear();
                    return request;
                }
            }
        }

        trace!(
            "external call start: context_id={} seq={} to={} create={}",
            request.context_id,
            request.seq,
            request.receiver,
            request.create
        );
        let response = self.suspender.suspend(request);
        self.seq = self.seq.max(response.seq);
        self.key_locks.extend(response.key_locks.iter().cloned());
        trace!(
            "external call finish: context_id={} seq={} status={}",
            response.context_id,
            response.seq,
            response.status
        );
        response
    }

    /// Claims a named key lock before touching a guarded key. Denial means
    /// another in-flight transaction holds the lock; the frame fails fast
    /// with a dead-lock condition instead of waiting.
    pub fn acquire_key_lock(&mut self, name: &str) -> VmResult<()> {
        if self.key_locks.contains(name) {
            return Ok(());
        }
        let mut request = CallMessage::new(CallKind::KeyLock);
        request.context_id = self.context_id;
        request.seq = self.seq;
        request.sender = self.contract_address.clone();
        request.receiver = self.contract_address.clone();
        request.acquire_key_lock = Some(name.to_string());
        request.key_locks = self.key_locks.clone();

        let mut response = self.suspender.suspend(request);
        if response.kind == CallKind::Revert
            || response.status == TransactionStatus::DeadLock
        {
            return Err(VmError::DeadLock(name.to_string()));
        }
        self.key_locks.append(&mut response.key_locks);
        self.key_locks.insert(name.to_string());
        Ok(())
    }

    /// Rolls back every storage write recorded since this executive's
    /// recorder was last cleared.
    pub fn revert(&mut self) {
        info!(
            "Revert transaction: context_id={} seq={}",
            self.context_id, self.seq
        );
        self.storage.rollback();
    }

    fn check_auth(&mut self, call: &mut CallMessage) -> bool {
        // static calls carry no authority to check; precompiled addresses
        // are vetted by their own implementations
        if call.static_call || self.precompiled.contains(&call.receiver) {
            return true;
        }
        let Some(auth) = self.precompiled.get(AUTH_MANAGER_ADDRESS) else {
            return true;
        };
        let params = PrecompiledParams {
            input: call.data.clone(),
            origin: call.origin.clone(),
            sender: call.sender.clone(),
            gas_left: call.gas,
        };
        let allowed = match auth.call(self, params) {
            Ok(result) => result.output.first() != Some(&0),
            Err(err) => {
                warn!("authorization check failed: {}", err);
                false
            }
        };
        if !allowed {
            let text = if call.create {
                "Create permission denied"
            } else {
                "Call permission denied"
            };
            info!(
                "Revert transaction: {}: origin={} to={}",
                text, call.origin, call.receiver
            );
            call.kind = CallKind::Revert;
            call.status = TransactionStatus::PermissionDenied;
            call.vm_status = vm_status::REVERT;
            call.message = text.to_string();
            call.data = text.as_bytes().to_vec();
            call.create = false;
        }
        allowed
    }

    /// Stores the deposited code, caching its hash on first deposit.
    fn set_code(
        &mut self, table: &str, code: Vec<u8>,
    ) -> Result<(), ExecutorError> {
        if self.storage.get_row(table, ACCOUNT_CODE_HASH).is_none() {
            let hash = self.hasher.hash(&code);
            self.storage.set_row(
                table,
                ACCOUNT_CODE_HASH,
                Entry::new(hash.as_bytes().to_vec()),
            )?;
        }
        self.storage
            .set_row(table, ACCOUNT_CODE, Entry::new(code))?;
        Ok(())
    }

    fn set_abi(
        &mut self, table: &str, abi: &str,
    ) -> Result<(), ExecutorError> {
        self.storage.set_row(
            table,
            ACCOUNT_ABI,
            Entry::new(abi.as_bytes().to_vec()),
        )?;
        Ok(())
    }

    /// Derives the address of a contract created by this transaction.
    fn next_contract_address(&self, request: &CallMessage) -> String {
        let mut seed = Vec::new();
        match request.create_salt {
            Some(salt) => {
                seed.extend_from_slice(request.sender.as_bytes());
                seed.extend_from_slice(salt.as_bytes());
                seed.extend_from_slice(
                    self.hasher.hash(&request.data).as_bytes(),
                );
            }
            None => {
                seed.extend_from_slice(&self.block_number.to_be_bytes());
                seed.extend_from_slice(&self.context_id.to_be_bytes());
                seed.extend_from_slice(&self.seq.to_be_bytes());
            }
        }
        let hash = self.hasher.hash(&seed);
        hash.as_bytes()[12..].to_hex()
    }

    fn trace_refunds(&self, schedule: &GasSchedule, substate: &Substate) {
        let refunds = substate.refunds
            + schedule.suicide_refund_gas * substate.suicides.len() as u64;
        if refunds > 0 {
            trace!(
                "frame refunds: context_id={} seq={} refunds={}",
                self.context_id,
                self.seq,
                refunds
            );
        }
    }
}

fn set_failure(out: &mut CallMessage, status: TransactionStatus, text: &str) {
    out.status = status;
    out.message = text.to_string();
    out.data = text.as_bytes().to_vec();
}

fn reject(
    mut call: CallMessage, status: TransactionStatus, text: &str,
) -> CallMessage {
    call.kind = CallKind::Revert;
    call.vm_status = vm_status::REVERT;
    set_failure(&mut call, status, text);
    call
}
