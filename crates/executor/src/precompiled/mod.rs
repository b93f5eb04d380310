// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! The precompiled-contract collaborator boundary. Precompiled contracts
//! are fixed-address, natively implemented contracts registered ahead of a
//! block's execution. They run host-native logic and may re-enter the
//! executive: read and write storage through it, take key locks, or issue
//! nested calls.

use crate::executive::TransactionExecutive;
use basalt_vm_types::VmResult;
use std::{collections::HashMap, sync::Arc};

/// Address the authorization-manager precompiled contract is registered
/// under when the chain enables authorization checking.
pub const AUTH_MANAGER_ADDRESS: &str =
    "0000000000000000000000000000000000001005";

/// Input to one precompiled call, cut down from the in-flight message.
#[derive(Clone, Debug)]
pub struct PrecompiledParams {
    pub input: Vec<u8>,
    pub origin: String,
    pub sender: String,
    pub gas_left: i64,
}

/// What a precompiled call produced. A negative `gas_left` makes the
/// executive fail the frame with an out-of-gas status.
#[derive(Clone, Debug)]
pub struct PrecompiledExecResult {
    pub output: Vec<u8>,
    pub gas_left: i64,
}

/// A natively implemented contract. Implementations must be re-entrant:
/// the executive handle they receive may be used to call back into the
/// execution core.
pub trait Precompiled: Send + Sync {
    fn call(
        &self, executive: &mut TransactionExecutive,
        params: PrecompiledParams,
    ) -> VmResult<PrecompiledExecResult>;
}

/// Address-keyed registry of precompiled contracts, fixed before a block
/// starts executing.
#[derive(Default)]
pub struct PrecompiledRegistry {
    contracts: HashMap<String, Arc<dyn Precompiled>>,
}

impl PrecompiledRegistry {
    pub fn new() -> PrecompiledRegistry { PrecompiledRegistry::default() }

    pub fn register(
        &mut self, address: impl Into<String>,
        contract: Arc<dyn Precompiled>,
    ) {
        self.contracts.insert(address.into(), contract);
    }

    pub fn contains(&self, address: &str) -> bool {
        self.contracts.contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<Arc<dyn Precompiled>> {
        self.contracts.get(address).cloned()
    }
}
