// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Domain outcome of one call, carried on the outgoing message. The numeric
/// values are part of the receipt format and must stay stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    None = 0,
    Unknown = 1,
    BadInstruction = 10,
    BadJumpDestination = 11,
    OutOfGas = 12,
    OutOfStack = 13,
    StackUnderflow = 14,
    PrecompiledError = 15,
    RevertInstruction = 16,
    ContractAddressAlreadyUsed = 17,
    PermissionDenied = 18,
    CallAddressError = 19,
    WasmValidationFailure = 32,
    WasmArgumentOutOfRange = 33,
    WasmUnreachableInstruction = 34,
    WasmTrap = 35,
    /// A key-lock acquisition was denied because another in-flight
    /// transaction holds the lock. Distinguished from a plain revert so the
    /// scheduler can avoid retrying within the same pass.
    DeadLock = 40,
}

impl TransactionStatus {
    pub fn code(self) -> i32 { self as i32 }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            TransactionStatus::None => "None",
            TransactionStatus::Unknown => "Unknown",
            TransactionStatus::BadInstruction => "BadInstruction",
            TransactionStatus::BadJumpDestination => "BadJumpDestination",
            TransactionStatus::OutOfGas => "OutOfGas",
            TransactionStatus::OutOfStack => "OutOfStack",
            TransactionStatus::StackUnderflow => "StackUnderflow",
            TransactionStatus::PrecompiledError => "PrecompiledError",
            TransactionStatus::RevertInstruction => "RevertInstruction",
            TransactionStatus::ContractAddressAlreadyUsed => {
                "ContractAddressAlreadyUsed"
            }
            TransactionStatus::PermissionDenied => "PermissionDenied",
            TransactionStatus::CallAddressError => "CallAddressError",
            TransactionStatus::WasmValidationFailure => {
                "WasmValidationFailure"
            }
            TransactionStatus::WasmArgumentOutOfRange => {
                "WasmArgumentOutOfRange"
            }
            TransactionStatus::WasmUnreachableInstruction => {
                "WasmUnreachableInstruction"
            }
            TransactionStatus::WasmTrap => "WasmTrap",
            TransactionStatus::DeadLock => "DeadLock",
        };
        write!(f, "{}", text)
    }
}
