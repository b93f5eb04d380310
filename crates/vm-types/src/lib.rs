// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Basalt VM Types: the types shared between the transaction executive, the
//! host bridge, and the bytecode interpreters. The central one is
//! [`CallMessage`], the protocol object exchanged with the external
//! scheduler across every suspend/resume boundary; around it sit the domain
//! status taxonomy, the interpreter seam ([`Interpreter`],
//! [`InterpreterMessage`], [`VmExecResult`]), the host callback table
//! ([`HostInterface`]), and the capability revision
//! ([`BlockVersion`]/[`Features`]/[`GasSchedule`]).

mod call_message;
mod error;
mod hash;
mod host;
mod interpreter;
mod log_entry;
mod schedule;
mod status;

pub use call_message::{CallKind, CallMessage};
pub use error::{VmError, VmResult};
pub use hash::{Hasher, Keccak256};
pub use host::{HostInterface, StorageStatus};
pub use interpreter::{
    vm_status, Interpreter, InterpreterCallKind, InterpreterMessage,
    VmExecResult,
};
pub use log_entry::LogEntry;
pub use schedule::{BlockVersion, Features, GasSchedule, Revision};
pub use status::TransactionStatus;
