// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use std::fmt;

/// Recoverable failures raised while a call frame is running. Every variant
/// ends up as a `Revert` message after the frame's storage writes are
/// rolled back; none of them unwind past the executive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VmError {
    OutOfGas,
    /// A state-mutating host call was issued under the static flag.
    MutableCallInStaticContext,
    /// The buffer is not acceptable WASM, or the metering pass rejected it.
    WasmValidation(String),
    /// Contract creation targeted an address that already has a table.
    ConflictAddress(String),
    /// A key lock was denied; the payload is the lock name.
    DeadLock(String),
    /// A precompiled contract rejected the call.
    PrecompiledFailure(String),
    /// Unclassified failure inside a collaborator.
    Internal(String),
}

pub type VmResult<T> = Result<T, VmError>;

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VmError::OutOfGas => write!(f, "out of gas"),
            VmError::MutableCallInStaticContext => {
                write!(f, "mutable call in static context")
            }
            VmError::WasmValidation(msg) => {
                write!(f, "wasm validation failed: {}", msg)
            }
            VmError::ConflictAddress(address) => {
                write!(f, "contract address {} already in use", address)
            }
            VmError::DeadLock(key) => {
                write!(f, "key lock {} is held by another transaction", key)
            }
            VmError::PrecompiledFailure(msg) => {
                write!(f, "precompiled contract failed: {}", msg)
            }
            VmError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}
