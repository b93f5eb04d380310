// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use basalt_vm_types::LogEntry;
use std::collections::BTreeSet;

/// Effects of a single call frame that must land or vanish atomically: on
/// a successful return the bundle is folded into the outgoing message, on a
/// revert it is dropped wholesale.
#[derive(Debug, Default)]
pub struct Substate {
    /// Accounts self-destructed by this frame.
    pub suicides: BTreeSet<String>,

    /// Logs emitted by this frame and its completed children, in
    /// depth-first order.
    pub logs: Vec<LogEntry>,

    /// Gas refund counter (storage deletions, self-destructs).
    pub refunds: u64,
}

impl Substate {
    pub fn new() -> Substate { Substate::default() }
}
