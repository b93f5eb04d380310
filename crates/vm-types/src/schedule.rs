// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use serde_derive::{Deserialize, Serialize};

/// Chain compatibility version, ordered so later upgrades compare greater.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum BlockVersion {
    V3_0,
    V3_1,
    V3_2,
}

/// Fine-grained behavior switches layered on top of [`BlockVersion`],
/// derived from chain configuration when a block context is built.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Features {
    /// Delegate-call and call-code requests from the interpreter are
    /// honored; otherwise they are answered with an invalid-instruction
    /// result.
    pub delegate_call: bool,
    /// Nested static-call flags from the interpreter propagate into the
    /// outgoing request.
    pub static_call_flag: bool,
}

/// The ordered snapshot of interpreter capabilities a call runs under.
#[derive(Clone, Copy, Debug)]
pub struct Revision {
    pub version: BlockVersion,
    pub features: Features,
}

/// Gas accounting parameters that belong to the execution core. Per-opcode
/// costs live inside the interpreters; only the charges levied by the
/// executive itself appear here.
#[derive(Clone, Debug)]
pub struct GasSchedule {
    /// Largest code buffer a creation may deposit.
    pub max_code_size: usize,
    /// Charge per byte of deposited contract code.
    pub create_data_gas: i64,
    /// Refund granted when a storage write deletes a non-zero value.
    pub sstore_refund_gas: u64,
    /// Refund granted per self-destructed account.
    pub suicide_refund_gas: u64,
    /// Whether an unaffordable code-deposit charge fails the creation.
    /// When unset the deployment is still finalized and the remaining gas
    /// may go negative.
    pub exceptional_failed_code_deposit: bool,
}

impl Default for GasSchedule {
    fn default() -> GasSchedule {
        GasSchedule {
            max_code_size: 0x40000,
            create_data_gas: 200,
            sstore_refund_gas: 15000,
            suicide_refund_gas: 24000,
            exceptional_failed_code_deposit: true,
        }
    }
}
