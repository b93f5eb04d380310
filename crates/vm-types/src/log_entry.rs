// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use ethereum_types::H256;
use serde_derive::{Deserialize, Serialize};

/// One event emitted by contract code, tagged with the address of the
/// contract that was executing when it was emitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<H256>,
    pub data: Vec<u8>,
}
