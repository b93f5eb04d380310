// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{
    error::VmResult,
    interpreter::{InterpreterMessage, VmExecResult},
};
use ethereum_types::H256;

/// Classification of a storage write, computed by comparing the old and new
/// values. The interpreter folds it into its own refund accounting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageStatus {
    Unchanged,
    Added,
    Modified,
    Deleted,
}

/// The fixed callback table a bytecode interpreter runs against. Each
/// callback is a storage access, a nested call routed through the
/// executive, or a sub-state mutation, and nothing else; gas charging for
/// storage access belongs to the interpreter's own metering.
pub trait HostInterface {
    /// Reads a slot from the bound storage table. A missing entry reads as
    /// the all-zero value, not an error.
    fn storage_load(&self, key: &[u8]) -> VmResult<Vec<u8>>;

    /// Writes a slot and classifies the change. Deleting a non-zero value
    /// records a refund into the frame's sub-state.
    fn storage_store(&mut self, key: &[u8], value: &[u8])
        -> VmResult<StorageStatus>;

    /// Appends a log entry tagged with the executing contract's address
    /// into the in-flight call's result. Reverting the call discards it.
    fn emit_log(&mut self, topics: Vec<H256>, data: &[u8]) -> VmResult<()>;

    /// Marks the executing contract as self-destructed in the sub-state.
    fn suicide(&mut self) -> VmResult<()>;

    /// Entry point for the CALL/CREATE opcode family.
    fn external_request(
        &mut self, message: InterpreterMessage,
    ) -> VmResult<VmExecResult>;

    /// The bound contract's stored code.
    fn code(&self) -> VmResult<Option<Vec<u8>>>;

    /// Hash of the bound contract's code.
    fn code_hash(&self) -> VmResult<H256>;

    fn my_address(&self) -> &str;
    fn caller(&self) -> &str;
    fn origin(&self) -> &str;
    fn gas(&self) -> i64;
    fn is_static(&self) -> bool;
    fn is_wasm(&self) -> bool;
    fn block_number(&self) -> u64;
    fn timestamp(&self) -> u64;
    fn block_gas_limit(&self) -> u64;
    fn block_hash(&self, number: u64) -> H256;
}
