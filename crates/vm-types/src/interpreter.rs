// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{host::HostInterface, schedule::Revision};
use ethereum_types::H256;

/// Interpreter status codes. The numbering is shared with the interpreters
/// and is the input to the executive's status translation; everything at or
/// below [`vm_status::INTERNAL_ERROR`] marks a defect in the interpreter or
/// the bridge rather than a transaction outcome.
pub mod vm_status {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const REVERT: i32 = 2;
    pub const OUT_OF_GAS: i32 = 3;
    pub const INVALID_INSTRUCTION: i32 = 4;
    pub const UNDEFINED_INSTRUCTION: i32 = 5;
    pub const STACK_OVERFLOW: i32 = 6;
    pub const STACK_UNDERFLOW: i32 = 7;
    pub const BAD_JUMP_DESTINATION: i32 = 8;
    pub const INVALID_MEMORY_ACCESS: i32 = 9;
    pub const CALL_DEPTH_EXCEEDED: i32 = 10;
    pub const STATIC_MODE_VIOLATION: i32 = 11;
    pub const PRECOMPILE_FAILURE: i32 = 12;
    pub const CONTRACT_VALIDATION_FAILURE: i32 = 13;
    pub const ARGUMENT_OUT_OF_RANGE: i32 = 14;
    pub const WASM_UNREACHABLE_INSTRUCTION: i32 = 15;
    pub const WASM_TRAP: i32 = 16;

    pub const INTERNAL_ERROR: i32 = -1;
    pub const REJECTED: i32 = -2;
    pub const OUT_OF_MEMORY: i32 = -3;
}

/// The call-family opcode a nested request originates from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterpreterCallKind {
    Call,
    DelegateCall,
    CallCode,
    Create,
    Create2,
}

/// The interpreter-native shape of one call, handed to `execute` and to the
/// host bridge's `external_request`.
#[derive(Clone, Debug)]
pub struct InterpreterMessage {
    pub kind: InterpreterCallKind,
    pub is_static: bool,
    pub gas: i64,
    pub sender: String,
    pub destination: String,
    pub input: Vec<u8>,
    pub create_salt: Option<H256>,
}

/// What an interpreter run produced.
#[derive(Clone, Debug)]
pub struct VmExecResult {
    pub status: i32,
    pub gas_left: i64,
    pub output: Vec<u8>,
    pub create_address: String,
}

impl VmExecResult {
    pub fn success(gas_left: i64, output: Vec<u8>) -> VmExecResult {
        VmExecResult {
            status: vm_status::SUCCESS,
            gas_left,
            output,
            create_address: String::new(),
        }
    }

    pub fn failure(status: i32, gas_left: i64) -> VmExecResult {
        VmExecResult {
            status,
            gas_left,
            output: Vec::new(),
            create_address: String::new(),
        }
    }
}

/// A bytecode interpreter. Instruction semantics are opaque to the
/// execution core: engines are registered as constructors, instantiated
/// fresh for every call, and talk back only through [`HostInterface`].
pub trait Interpreter: Send {
    fn execute(
        &mut self, host: &mut dyn HostInterface, revision: Revision,
        message: &InterpreterMessage, code: &[u8],
    ) -> VmExecResult;
}
