// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! The storage collaborator boundary. The executive never touches state
//! except through [`Storage`], and every write goes through a
//! [`StorageWrapper`] that records the prior value into a [`Recorder`] so
//! the frame can be rolled back atomically.

mod memory;
mod wrapper;

pub use memory::MemoryStorage;
pub use wrapper::StorageWrapper;

use thiserror::Error;

/// Row key a contract's code is stored under inside its table.
pub const ACCOUNT_CODE: &[u8] = b"code";
/// Row key of the cached code hash.
pub const ACCOUNT_CODE_HASH: &[u8] = b"codeHash";
/// Row key of the interface descriptor deposited with WASM contracts.
pub const ACCOUNT_ABI: &[u8] = b"abi";

/// Field layout of contract tables: a single opaque value column.
pub const STORAGE_VALUE: &str = "value";

/// Contract tables live under this directory.
pub const APPS_PREFIX: &str = "/apps/";

/// Maps a contract address to its storage table name. WASM contracts are
/// addressed by path; EVM-flavored addresses are hex strings.
pub fn contract_table_name(address: &str, is_wasm: bool) -> String {
    if is_wasm {
        if address.starts_with('/') {
            address.to_string()
        } else {
            format!("{}{}", APPS_PREFIX, address)
        }
    } else {
        let stripped = address.strip_prefix("0x").unwrap_or(address);
        format!("{}{}", APPS_PREFIX, stripped.to_lowercase())
    }
}

/// One row of a table: an opaque byte value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entry {
    pub value: Vec<u8>,
}

impl Entry {
    pub fn new(value: Vec<u8>) -> Entry { Entry { value } }
}

/// Handle to an opened or newly created table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    pub name: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("table {0} already exists")]
    TableAlreadyExists(String),

    #[error("table {0} does not exist")]
    NoSuchTable(String),
}

/// The versioned key-value store at this core's boundary. Reads may be
/// shared across concurrently running executives; isolation of buffered
/// writes is the implementation's contract.
pub trait Storage: Send + Sync {
    fn open_table(&self, name: &str) -> Option<Table>;

    fn create_table(
        &self, name: &str, value_field: &str,
    ) -> Result<Table, StorageError>;

    fn get_row(&self, table: &str, key: &[u8]) -> Option<Entry>;

    fn set_row(
        &self, table: &str, key: &[u8], entry: Entry,
    ) -> Result<(), StorageError>;

    /// Undoes every change the recorder holds, most recent first.
    fn rollback(&self, recorder: &Recorder);
}

/// One undoable change.
#[derive(Clone, Debug)]
pub enum Change {
    /// A row write; `prev` is the value before the write, `None` when the
    /// row did not exist.
    Row {
        table: String,
        key: Vec<u8>,
        prev: Option<Entry>,
    },
    /// A table creation.
    TableCreated { table: String },
}

/// The undo log scoped to one executive. Replayed in reverse by
/// [`Storage::rollback`].
#[derive(Debug, Default)]
pub struct Recorder {
    changes: Vec<Change>,
}

impl Recorder {
    pub fn new() -> Recorder { Recorder::default() }

    pub fn record(&mut self, change: Change) { self.changes.push(change); }

    pub fn changes(&self) -> &[Change] { &self.changes }

    pub fn clear(&mut self) { self.changes.clear(); }

    pub fn is_empty(&self) -> bool { self.changes.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::contract_table_name;

    #[test]
    fn table_names_follow_address_flavor() {
        assert_eq!(
            contract_table_name("0xAbCd01", false),
            "/apps/abcd01".to_string()
        );
        assert_eq!(contract_table_name("abcd01", false), "/apps/abcd01");
        assert_eq!(contract_table_name("/apps/hello", true), "/apps/hello");
        assert_eq!(contract_table_name("hello", true), "/apps/hello");
    }
}
