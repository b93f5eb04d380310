// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{
    block_context::BlockContext,
    executive::TransactionExecutive,
    precompiled::PrecompiledParams,
    storage::{Entry, ACCOUNT_CODE, ACCOUNT_CODE_HASH},
    substate::Substate,
};
use basalt_vm_types::{
    vm_status, CallKind, CallMessage, HostInterface, InterpreterCallKind,
    InterpreterMessage, LogEntry, StorageStatus, VmError, VmExecResult,
    VmResult,
};
use ethereum_types::H256;
use std::sync::Arc;

/// Borrowed-code information for a delegate call, resolved by the caller's
/// executive before the request crossed the boundary.
#[derive(Clone, Debug)]
pub struct DelegateInfo {
    pub code: Vec<u8>,
    pub sender: String,
}

/// The capability table handed to an interpreter, selected once at
/// construction. The two variants differ in which address is authoritative
/// for code identity versus storage, never in anything else.
pub enum Host<'a> {
    Call(HostContext<'a>),
    Delegate(DelegateHostContext<'a>),
}

impl<'a> Host<'a> {
    pub fn new(
        executive: &'a mut TransactionExecutive, block: Arc<BlockContext>,
        message: CallMessage, table: String, delegate: Option<DelegateInfo>,
    ) -> Host<'a> {
        let inner = HostContext::new(executive, block, message, table);
        match delegate {
            Some(info) => Host::Delegate(DelegateHostContext {
                inner,
                code: info.code,
                sender: info.sender,
            }),
            None => Host::Call(inner),
        }
    }

    pub fn into_parts(self) -> (CallMessage, Substate) {
        match self {
            Host::Call(host) => host.into_parts(),
            Host::Delegate(host) => host.inner.into_parts(),
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $host:ident => $body:expr) => {
        match $self {
            Host::Call($host) => $body,
            Host::Delegate($host) => $body,
        }
    };
}

impl<'a> HostInterface for Host<'a> {
    fn storage_load(&self, key: &[u8]) -> VmResult<Vec<u8>> {
        dispatch!(self, host => host.storage_load(key))
    }

    fn storage_store(
        &mut self, key: &[u8], value: &[u8],
    ) -> VmResult<StorageStatus> {
        dispatch!(self, host => host.storage_store(key, value))
    }

    fn emit_log(&mut self, topics: Vec<H256>, data: &[u8]) -> VmResult<()> {
        dispatch!(self, host => host.emit_log(topics, data))
    }

    fn suicide(&mut self) -> VmResult<()> {
        dispatch!(self, host => host.suicide())
    }

    fn external_request(
        &mut self, message: InterpreterMessage,
    ) -> VmResult<VmExecResult> {
        dispatch!(self, host => host.external_request(message))
    }

    fn code(&self) -> VmResult<Option<Vec<u8>>> {
        dispatch!(self, host => host.code())
    }

    fn code_hash(&self) -> VmResult<H256> {
        dispatch!(self, host => host.code_hash())
    }

    fn my_address(&self) -> &str { dispatch!(self, host => host.my_address()) }

    fn caller(&self) -> &str { dispatch!(self, host => host.caller()) }

    fn origin(&self) -> &str { dispatch!(self, host => host.origin()) }

    fn gas(&self) -> i64 { dispatch!(self, host => host.gas()) }

    fn is_static(&self) -> bool { dispatch!(self, host => host.is_static()) }

    fn is_wasm(&self) -> bool { dispatch!(self, host => host.is_wasm()) }

    fn block_number(&self) -> u64 {
        dispatch!(self, host => host.block_number())
    }

    fn timestamp(&self) -> u64 { dispatch!(self, host => host.timestamp()) }

    fn block_gas_limit(&self) -> u64 {
        dispatch!(self, host => host.block_gas_limit())
    }

    fn block_hash(&self, number: u64) -> H256 {
        dispatch!(self, host => host.block_hash(number))
    }
}

/// The host bridge for an ordinary call: code and storage both belong to
/// the message's receiver.
pub struct HostContext<'a> {
    executive: &'a mut TransactionExecutive,
    block: Arc<BlockContext>,
    /// The in-flight message; logs and the final result are built into it.
    message: CallMessage,
    /// Storage table bound to this frame.
    table: String,
    substate: Substate,
}

impl<'a> HostContext<'a> {
    pub fn new(
        executive: &'a mut TransactionExecutive, block: Arc<BlockContext>,
        mut message: CallMessage, table: String,
    ) -> HostContext<'a> {
        let mut substate = Substate::new();
        // the caller's accumulated log entries travel with the request
        substate.logs = std::mem::take(&mut message.log_entries);
        HostContext {
            executive,
            block,
            message,
            table,
            substate,
        }
    }

    pub fn into_parts(self) -> (CallMessage, Substate) {
        (self.message, self.substate)
    }

    fn storage_load(&self, key: &[u8]) -> VmResult<Vec<u8>> {
        let value = self
            .executive
            .storage()
            .get_row(&self.table, key)
            .map(|entry| entry.value)
            .unwrap_or_else(|| vec![0u8; 32]);
        Ok(value)
    }

    fn storage_store(
        &mut self, key: &[u8], value: &[u8],
    ) -> VmResult<StorageStatus> {
        if self.message.static_call {
            return Err(VmError::MutableCallInStaticContext);
        }
        let old = self
            .executive
            .storage()
            .get_row(&self.table, key)
            .map(|entry| entry.value);
        self.executive
            .storage_mut()
            .set_row(&self.table, key, Entry::new(value.to_vec()))
            .map_err(|err| VmError::Internal(err.to_string()))?;

        let status = classify_store(old.as_deref(), value);
        if status == StorageStatus::Deleted {
            self.substate.refunds += self.block.schedule.sstore_refund_gas;
        }
        Ok(status)
    }

    fn emit_log(&mut self, topics: Vec<H256>, data: &[u8]) -> VmResult<()> {
        if self.message.static_call {
            return Err(VmError::MutableCallInStaticContext);
        }
        let address = self.message.receiver.clone();
        self.substate.logs.push(LogEntry {
            address,
            topics,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn suicide(&mut self) -> VmResult<()> {
        if self.message.static_call {
            return Err(VmError::MutableCallInStaticContext);
        }
        self.substate.suicides.insert(self.message.receiver.clone());
        Ok(())
    }

    fn external_request(
        &mut self, imsg: InterpreterMessage,
    ) -> VmResult<VmExecResult> {
        // gas is widened upstream, so it can arrive negative in extreme
        // cases and must not reach the scheduler that way
        if imsg.gas < 0 {
            warn!("nested call carries negative gas: {}", imsg.gas);
            return Ok(VmExecResult::failure(vm_status::OUT_OF_GAS, 0));
        }

        let mut request = CallMessage::new(CallKind::Message);
        request.origin = self.message.origin.clone();
        request.sender = self.message.receiver.clone();
        request.gas = imsg.gas;
        match imsg.kind {
            InterpreterCallKind::Create | InterpreterCallKind::Create2 => {
                request.create = true;
                request.create_salt = imsg.create_salt;
                request.data = imsg.input;
            }
            InterpreterCallKind::Call => {
                request.receiver = imsg.destination.clone();
                request.code_address = imsg.destination;
                request.data = imsg.input;
            }
            InterpreterCallKind::DelegateCall
            | InterpreterCallKind::CallCode => {
                if !self.block.features.delegate_call || self.block.is_wasm {
                    warn!(
                        "delegate call is unsupported under this revision, \
                         answering with invalid instruction"
                    );
                    return Ok(VmExecResult::failure(
                        vm_status::INVALID_INSTRUCTION,
                        0,
                    ));
                }
                request.delegate_call = true;
                request.code_address = imsg.destination;
                request.delegate_call_sender = imsg.sender.clone();
                // delegated code runs against this frame's storage
                request.receiver = self.message.receiver.clone();
                request.data = imsg.input;
            }
        }

        // log entries ride the message in depth-first order
        request.log_entries = std::mem::take(&mut self.substate.logs);

        // two address ranges resolve locally: they are pure functions over
        // the input bytes, so there is no need to suspend for them
        if self.executive.is_precompiled(&request.receiver) {
            return Ok(self.call_local_precompiled(request, false));
        }
        if !self.block.is_wasm
            && self.executive.is_evm_builtin(&request.receiver)
        {
            return Ok(self.call_local_precompiled(request, true));
        }

        request.static_call = self.message.static_call
            || (imsg.is_static && self.block.features.static_call_flag);

        let mut response = self.executive.external_call(request);
        // the response brings the combined log sequence back
        self.substate.logs = std::mem::take(&mut response.log_entries);
        Ok(VmExecResult {
            status: response.vm_status,
            gas_left: response.gas,
            output: std::mem::take(&mut response.data),
            create_address: std::mem::take(
                &mut response.new_contract_address,
            ),
        })
    }

    fn call_local_precompiled(
        &mut self, mut request: CallMessage, builtin_range: bool,
    ) -> VmExecResult {
        let result = if builtin_range {
            let builtins = self.executive.evm_builtins();
            match builtins.get(&request.receiver) {
                Some(builtin) => {
                    let cost = builtin.cost(&request.data) as i64;
                    if cost > request.gas {
                        VmExecResult::failure(vm_status::OUT_OF_GAS, 0)
                    } else {
                        match builtin.execute(&request.data) {
                            Ok(output) => VmExecResult::success(
                                request.gas - cost,
                                output,
                            ),
                            Err(err) => {
                                debug!("builtin failed: {}", err.0);
                                VmExecResult::failure(
                                    vm_status::PRECOMPILE_FAILURE,
                                    0,
                                )
                            }
                        }
                    }
                }
                None => {
                    VmExecResult::failure(vm_status::PRECOMPILE_FAILURE, 0)
                }
            }
        } else {
            let params = PrecompiledParams {
                input: request.data.clone(),
                origin: request.origin.clone(),
                sender: request.sender.clone(),
                gas_left: request.gas,
            };
            let address = request.receiver.clone();
            match self.executive.run_precompiled(&address, params) {
                Ok(result) if result.gas_left < 0 => {
                    VmExecResult::failure(vm_status::OUT_OF_GAS, 0)
                }
                Ok(result) => {
                    VmExecResult::success(result.gas_left, result.output)
                }
                Err(err) => {
                    debug!("precompiled failed: {}", err);
                    VmExecResult::failure(vm_status::PRECOMPILE_FAILURE, 0)
                }
            }
        };
        // hand the in-flight log sequence back to this frame
        self.substate.logs = std::mem::take(&mut request.log_entries);
        result
    }

    fn code(&self) -> VmResult<Option<Vec<u8>>> {
        Ok(self
            .executive
            .storage()
            .get_row(&self.table, ACCOUNT_CODE)
            .map(|entry| entry.value))
    }

    fn code_hash(&self) -> VmResult<H256> {
        if let Some(entry) =
            self.executive.storage().get_row(&self.table, ACCOUNT_CODE_HASH)
        {
            if entry.value.len() == 32 {
                return Ok(H256::from_slice(&entry.value));
            }
        }
        // not cached yet: derive it from the code itself
        Ok(match self.code()? {
            Some(code) => self.block.hasher().hash(&code),
            None => H256::zero(),
        })
    }

    fn my_address(&self) -> &str { &self.message.receiver }

    fn caller(&self) -> &str { &self.message.sender }

    fn origin(&self) -> &str { &self.message.origin }

    fn gas(&self) -> i64 { self.message.gas }

    fn is_static(&self) -> bool { self.message.static_call }

    fn is_wasm(&self) -> bool { self.block.is_wasm }

    fn block_number(&self) -> u64 { self.block.number }

    fn timestamp(&self) -> u64 { self.block.timestamp }

    fn block_gas_limit(&self) -> u64 { self.block.gas_limit }

    fn block_hash(&self, number: u64) -> H256 {
        self.block.block_hash_at(number)
    }
}

/// The host bridge for a delegate call: storage binds to the caller's
/// table while the code and the reported caller are borrowed from
/// elsewhere.
pub struct DelegateHostContext<'a> {
    inner: HostContext<'a>,
    code: Vec<u8>,
    sender: String,
}

impl<'a> DelegateHostContext<'a> {
    fn storage_load(&self, key: &[u8]) -> VmResult<Vec<u8>> {
        self.inner.storage_load(key)
    }

    fn storage_store(
        &mut self, key: &[u8], value: &[u8],
    ) -> VmResult<StorageStatus> {
        self.inner.storage_store(key, value)
    }

    fn emit_log(&mut self, topics: Vec<H256>, data: &[u8]) -> VmResult<()> {
        self.inner.emit_log(topics, data)
    }

    fn suicide(&mut self) -> VmResult<()> { self.inner.suicide() }

    fn external_request(
        &mut self, message: InterpreterMessage,
    ) -> VmResult<VmExecResult> {
        self.inner.external_request(message)
    }

    fn code(&self) -> VmResult<Option<Vec<u8>>> {
        Ok(Some(self.code.clone()))
    }

    fn code_hash(&self) -> VmResult<H256> {
        Ok(self.inner.block.hasher().hash(&self.code))
    }

    fn my_address(&self) -> &str { self.inner.my_address() }

    fn caller(&self) -> &str { &self.sender }

    fn origin(&self) -> &str { self.inner.origin() }

    fn gas(&self) -> i64 { self.inner.gas() }

    fn is_static(&self) -> bool { self.inner.is_static() }

    fn is_wasm(&self) -> bool { self.inner.is_wasm() }

    fn block_number(&self) -> u64 { self.inner.block_number() }

    fn timestamp(&self) -> u64 { self.inner.timestamp() }

    fn block_gas_limit(&self) -> u64 { self.inner.block_gas_limit() }

    fn block_hash(&self, number: u64) -> H256 {
        self.inner.block_hash(number)
    }
}

fn is_zero_value(value: &[u8]) -> bool {
    value.iter().all(|byte| *byte == 0)
}

fn classify_store(old: Option<&[u8]>, new: &[u8]) -> StorageStatus {
    let old_zero = old.map_or(true, is_zero_value);
    let new_zero = is_zero_value(new);
    match (old_zero, new_zero) {
        (true, true) => StorageStatus::Unchanged,
        (true, false) => StorageStatus::Added,
        (false, true) => StorageStatus::Deleted,
        (false, false) => {
            if old == Some(new) {
                StorageStatus::Unchanged
            } else {
                StorageStatus::Modified
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{classify_store, StorageStatus};

    #[test]
    fn store_classification_compares_old_and_new() {
        let zero = [0u8; 32];
        let one = {
            let mut word = [0u8; 32];
            word[31] = 1;
            word
        };
        let two = {
            let mut word = [0u8; 32];
            word[31] = 2;
            word
        };

        assert_eq!(classify_store(None, &zero), StorageStatus::Unchanged);
        assert_eq!(classify_store(None, &one), StorageStatus::Added);
        assert_eq!(
            classify_store(Some(&zero), &one),
            StorageStatus::Added
        );
        assert_eq!(
            classify_store(Some(&one), &one),
            StorageStatus::Unchanged
        );
        assert_eq!(
            classify_store(Some(&one), &two),
            StorageStatus::Modified
        );
        assert_eq!(
            classify_store(Some(&one), &zero),
            StorageStatus::Deleted
        );
        assert_eq!(classify_store(Some(&one), b""), StorageStatus::Deleted);
    }
}
