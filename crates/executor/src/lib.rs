// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! Basalt Executor: the transaction-execution core of a Basalt node. Given
//! one transaction's call and a block context, it runs the call's bytecode
//! (EVM- or WASM-flavored) against the versioned key-value store, yielding
//! to an external scheduler whenever the code needs a nested call or a key
//! lock, and finally hands back a `CallMessage` receipt together with a
//! rollback-safe set of storage mutations.

#[macro_use]
extern crate log;

/// Per-block read-only facts shared by every executive in a block, plus the
/// storage handle and the hash implementation.
pub mod block_context;

/// Pure built-in contracts of the Ethereum-compatible address range,
/// resolved locally by the host bridge.
pub mod builtin;

/// Boundary errors: caller bugs surfaced at the driver API, never part of a
/// per-transaction result.
pub mod error;

/// The per-transaction call-stack coordinator and its suspend/resume
/// machinery.
pub mod executive;

/// The precompiled-contract collaborator boundary.
pub mod precompiled;

/// The storage collaborator boundary, the transaction-scoped write
/// recorder, and an in-memory reference backend.
pub mod storage;

/// The accumulate-or-discard bundle of logs, refunds and destroyed-account
/// markers for one call frame.
pub mod substate;

/// VM selection, interpreter instance lifetime, the host bridge, and the
/// WASM gas-metering injector.
pub mod vm;

pub use block_context::BlockContext;
pub use error::ExecutorError;
pub use executive::{
    ExecutiveFactory, ExecutiveState, ExecutiveStatus, TransactionExecutive,
};
