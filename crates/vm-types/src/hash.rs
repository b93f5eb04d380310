// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use ethereum_types::H256;

/// The hash implementation used for code hashes and address derivation.
/// Threaded explicitly through the block context; there is no process-wide
/// default.
pub trait Hasher: Send + Sync {
    fn hash(&self, data: &[u8]) -> H256;
}

/// Keccak-256, the hash of EVM-flavored chains.
#[derive(Clone, Copy, Debug, Default)]
pub struct Keccak256;

impl Hasher for Keccak256 {
    fn hash(&self, data: &[u8]) -> H256 { keccak_hash::keccak(data) }
}

#[cfg(test)]
mod tests {
    use super::{Hasher, Keccak256};

    #[test]
    fn keccak_of_empty_input() {
        let hash = Keccak256.hash(b"");
        assert_eq!(
            format!("{:x}", hash),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }
}
