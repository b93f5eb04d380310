// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::{
    coroutine::ExecutiveCoroutine, transaction_executive::TransactionExecutive,
};
use crate::{
    block_context::BlockContext,
    builtin::{ethereum_builtins, Builtin},
    error::ExecutorError,
    precompiled::PrecompiledRegistry,
    vm::VmFactory,
};
use basalt_vm_types::CallMessage;
use std::{
    collections::BTreeMap,
    sync::{Arc, Weak},
};

/// Where an executive is in its single-use lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutiveStatus {
    /// Built but not yet started.
    NeedRun,
    /// Suspended on a nested call or a key-lock request; the last yielded
    /// message tells which.
    Paused,
    /// The final receipt was produced; no further resumption is possible.
    Finished,
}

/// Builds executives for one block: every executive shares the block
/// context, the precompiled registry, the built-in table and the engine
/// factory.
#[derive(Clone)]
pub struct ExecutiveFactory {
    block_context: Weak<BlockContext>,
    precompiled: Arc<PrecompiledRegistry>,
    builtins: Arc<BTreeMap<String, Builtin>>,
    vm_factory: Arc<VmFactory>,
}

impl ExecutiveFactory {
    pub fn new(
        block_context: &Arc<BlockContext>,
        precompiled: Arc<PrecompiledRegistry>, vm_factory: Arc<VmFactory>,
    ) -> ExecutiveFactory {
        ExecutiveFactory {
            block_context: Arc::downgrade(block_context),
            precompiled,
            builtins: Arc::new(ethereum_builtins()),
            vm_factory,
        }
    }

    pub fn build(
        &self, contract_address: &str, context_id: i64, seq: i64,
    ) -> ExecutiveState {
        ExecutiveState {
            contract_address: contract_address.to_string(),
            context_id,
            seq,
            status: ExecutiveStatus::NeedRun,
            coroutine: None,
            block_context: self.block_context.clone(),
            precompiled: self.precompiled.clone(),
            builtins: self.builtins.clone(),
            vm_factory: self.vm_factory.clone(),
        }
    }
}

/// The driver-facing handle of one executive. `start` and `resume` each
/// return the next message the executive yields: a `Message` or `KeyLock`
/// means it is suspended and waiting for `resume`, a `Finished` or
/// `Revert` is the final receipt.
pub struct ExecutiveState {
    contract_address: String,
    context_id: i64,
    seq: i64,
    status: ExecutiveStatus,
    coroutine: Option<ExecutiveCoroutine>,
    block_context: Weak<BlockContext>,
    precompiled: Arc<PrecompiledRegistry>,
    builtins: Arc<BTreeMap<String, Builtin>>,
    vm_factory: Arc<VmFactory>,
}

impl ExecutiveState {
    pub fn status(&self) -> ExecutiveStatus { self.status }

    pub fn context_id(&self) -> i64 { self.context_id }

    pub fn start(
        &mut self, input: CallMessage,
    ) -> Result<CallMessage, ExecutorError> {
        if self.status != ExecutiveStatus::NeedRun {
            return Err(ExecutorError::InvalidState(self.status));
        }
        let block_context = self.block_context.clone();
        let precompiled = self.precompiled.clone();
        let builtins = self.builtins.clone();
        let vm_factory = self.vm_factory.clone();
        let contract_address = self.contract_address.clone();
        let (context_id, seq) = (self.context_id, self.seq);

        let coroutine = ExecutiveCoroutine::spawn(move |suspender| {
            let block_context = block_context
                .upgrade()
                .ok_or(ExecutorError::BlockContextDropped)?;
            let mut executive = TransactionExecutive::new(
                &block_context,
                contract_address,
                context_id,
                seq,
                precompiled,
                builtins,
                vm_factory,
                suspender,
            );
            executive.start(input)
        })?;
        self.coroutine = Some(coroutine);
        self.advance()
    }

    pub fn resume(
        &mut self, response: CallMessage,
    ) -> Result<CallMessage, ExecutorError> {
        if self.status != ExecutiveStatus::Paused {
            return Err(ExecutorError::InvalidState(self.status));
        }
        self.coroutine
            .as_mut()
            .expect("a paused executive keeps its coroutine")
            .feed(response)?;
        self.advance()
    }

    fn advance(&mut self) -> Result<CallMessage, ExecutorError> {
        let coroutine = self
            .coroutine
            .as_mut()
            .expect("a running executive keeps its coroutine");
        let output = match coroutine.next_yield() {
            Ok(output) => output,
            Err(err) => {
                self.status = ExecutiveStatus::Finished;
                self.coroutine = None;
                return Err(err);
            }
        };
        self.status = if output.is_response() {
            self.coroutine = None;
            ExecutiveStatus::Finished
        } else {
            ExecutiveStatus::Paused
        };
        Ok(output)
    }
}
