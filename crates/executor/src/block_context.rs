// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::storage::Storage;
use basalt_vm_types::{
    BlockVersion, Features, GasSchedule, Hasher, Revision,
};
use ethereum_types::H256;
use std::sync::Arc;

/// Read-only per-block facts handed to every executive in a block. Shared
/// behind an `Arc` by the scheduler; executives keep only a weak reference
/// so the scheduler alone controls its lifetime.
pub struct BlockContext {
    storage: Arc<dyn Storage>,
    /// Snapshot of the state as of the previous committed version, for
    /// read-only lookups that must not observe this block's uncommitted
    /// writes.
    pub prior_storage: Option<Arc<dyn Storage>>,
    hasher: Arc<dyn Hasher>,

    pub number: u64,
    pub timestamp: u64,
    pub gas_limit: u64,
    pub block_hash: H256,

    /// WASM deployment mode for this chain.
    pub is_wasm: bool,
    /// Whether calls and creations go through the authorization check.
    pub is_auth_check: bool,

    pub version: BlockVersion,
    pub features: Features,
    pub schedule: GasSchedule,
}

impl BlockContext {
    pub fn new(
        storage: Arc<dyn Storage>, hasher: Arc<dyn Hasher>,
    ) -> BlockContext {
        BlockContext {
            storage,
            prior_storage: None,
            hasher,
            number: 0,
            timestamp: 0,
            gas_limit: 0,
            block_hash: H256::zero(),
            is_wasm: false,
            is_auth_check: false,
            version: BlockVersion::V3_2,
            features: Features::default(),
            schedule: GasSchedule::default(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> { &self.storage }

    pub fn hasher(&self) -> &Arc<dyn Hasher> { &self.hasher }

    pub fn revision(&self) -> Revision {
        Revision {
            version: self.version,
            features: self.features,
        }
    }

    /// Only the previous block's hash is maintained; every other height
    /// reads as zero.
    pub fn block_hash_at(&self, number: u64) -> H256 {
        if number + 1 == self.number {
            self.block_hash
        } else {
            H256::zero()
        }
    }
}
