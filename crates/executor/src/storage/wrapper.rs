// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use super::{Change, Entry, Recorder, Storage, StorageError, Table};
use std::sync::Arc;

/// Storage access scoped to one executive. Every mutation records its undo
/// information first, so [`StorageWrapper::rollback`] can discard the
/// frame's writes without touching what sibling executives wrote.
pub struct StorageWrapper {
    storage: Arc<dyn Storage>,
    recorder: Recorder,
}

impl StorageWrapper {
    pub fn new(storage: Arc<dyn Storage>) -> StorageWrapper {
        StorageWrapper {
            storage,
            recorder: Recorder::new(),
        }
    }

    pub fn open_table(&self, name: &str) -> Option<Table> {
        self.storage.open_table(name)
    }

    pub fn create_table(
        &mut self, name: &str, value_field: &str,
    ) -> Result<Table, StorageError> {
        let table = self.storage.create_table(name, value_field)?;
        self.recorder.record(Change::TableCreated {
            table: name.to_string(),
        });
        Ok(table)
    }

    pub fn get_row(&self, table: &str, key: &[u8]) -> Option<Entry> {
        self.storage.get_row(table, key)
    }

    pub fn set_row(
        &mut self, table: &str, key: &[u8], entry: Entry,
    ) -> Result<(), StorageError> {
        let prev = self.storage.get_row(table, key);
        self.storage.set_row(table, key, entry)?;
        self.recorder.record(Change::Row {
            table: table.to_string(),
            key: key.to_vec(),
            prev,
        });
        Ok(())
    }

    /// Rolls back everything recorded since the last rollback (or since
    /// construction) and clears the recorder.
    pub fn rollback(&mut self) {
        self.storage.rollback(&self.recorder);
        self.recorder.clear();
    }

    pub fn recorder(&self) -> &Recorder { &self.recorder }
}
