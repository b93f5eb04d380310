// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::{Change, Entry, Recorder, Storage, StorageError, Table};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// In-memory reference backend. Production deployments plug a versioned
/// persistent store in behind [`Storage`]; this one backs the test suites
/// and small tools.
#[derive(Default)]
pub struct MemoryStorage {
    tables: RwLock<HashMap<String, BTreeMap<Vec<u8>, Entry>>>,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage { MemoryStorage::default() }
}

impl Storage for MemoryStorage {
    fn open_table(&self, name: &str) -> Option<Table> {
        self.tables.read().contains_key(name).then(|| Table {
            name: name.to_string(),
        })
    }

    fn create_table(
        &self, name: &str, _value_field: &str,
    ) -> Result<Table, StorageError> {
        let mut tables = self.tables.write();
        if tables.contains_key(name) {
            return Err(StorageError::TableAlreadyExists(name.to_string()));
        }
        tables.insert(name.to_string(), BTreeMap::new());
        Ok(Table {
            name: name.to_string(),
        })
    }

    fn get_row(&self, table: &str, key: &[u8]) -> Option<Entry> {
        self.tables.read().get(table)?.get(key).cloned()
    }

    fn set_row(
        &self, table: &str, key: &[u8], entry: Entry,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables.write();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::NoSuchTable(table.to_string()))?;
        rows.insert(key.to_vec(), entry);
        Ok(())
    }

    fn rollback(&self, recorder: &Recorder) {
        let mut tables = self.tables.write();
        for change in recorder.changes().iter().rev() {
            match change {
                Change::Row { table, key, prev } => {
                    if let Some(rows) = tables.get_mut(table) {
                        match prev {
                            Some(entry) => {
                                rows.insert(key.clone(), entry.clone());
                            }
                            None => {
                                rows.remove(key);
                            }
                        }
                    }
                }
                Change::TableCreated { table } => {
                    tables.remove(table);
                }
            }
        }
    }
}
