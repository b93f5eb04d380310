// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{
    interpreter::vm_status, log_entry::LogEntry, status::TransactionStatus,
};
use ethereum_types::H256;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The role a message plays in the executive/scheduler protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// A request to run a call (top-level or nested).
    Message,
    /// A successful completion carrying the output.
    Finished,
    /// A failed completion; the frame's writes have been rolled back.
    Revert,
    /// A request to acquire a named key lock before proceeding.
    KeyLock,
}

/// The protocol object exchanged between an executive and its scheduler,
/// and between the host bridge and the executive. It is exclusively owned
/// by whichever side currently holds the turn and is transferred, never
/// shared, across the suspend/resume boundary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallMessage {
    pub kind: CallKind,

    /// Identity of the transaction within its block.
    pub context_id: i64,
    /// Identity of the frame within its transaction; nested requests get
    /// the next value.
    pub seq: i64,

    /// Sender of the whole transaction.
    pub origin: String,
    /// Immediate caller of this frame.
    pub sender: String,
    /// Account this frame runs as (and whose storage it binds).
    pub receiver: String,
    /// Account whose code runs; differs from `receiver` for delegate calls.
    pub code_address: String,

    /// Remaining gas. Signed: the code-deposit charge may drive it
    /// transiently negative and consumers must check.
    pub gas: i64,
    /// Call input on requests, output on responses.
    pub data: Vec<u8>,
    /// Interface descriptor threaded through WASM contract creation.
    pub abi: String,

    pub create: bool,
    pub create_salt: Option<H256>,
    pub static_call: bool,

    pub delegate_call: bool,
    /// Caller identity reported to delegated code.
    pub delegate_call_sender: String,
    /// Borrowed code to run, resolved before the request crosses the
    /// executive boundary.
    pub delegate_call_code: Option<Vec<u8>>,

    /// Domain outcome of the call.
    pub status: TransactionStatus,
    /// Raw interpreter status backing `status`, forwarded to the caller's
    /// interpreter on nested returns.
    pub vm_status: i32,
    /// Human-readable failure description.
    pub message: String,

    /// Emitted logs in depth-first order. Requests carry the caller's
    /// accumulated entries out; responses carry the combined sequence back.
    pub log_entries: Vec<LogEntry>,

    /// Key locks held by the sending frame.
    pub key_locks: BTreeSet<String>,
    /// Lock being requested, on `KeyLock` messages.
    pub acquire_key_lock: Option<String>,

    /// Address of the contract a successful creation produced.
    pub new_contract_address: String,
}

impl CallMessage {
    pub fn new(kind: CallKind) -> CallMessage {
        CallMessage {
            kind,
            context_id: 0,
            seq: 0,
            origin: String::new(),
            sender: String::new(),
            receiver: String::new(),
            code_address: String::new(),
            gas: 0,
            data: Vec::new(),
            abi: String::new(),
            create: false,
            create_salt: None,
            static_call: false,
            delegate_call: false,
            delegate_call_sender: String::new(),
            delegate_call_code: None,
            status: TransactionStatus::None,
            vm_status: vm_status::SUCCESS,
            message: String::new(),
            log_entries: Vec::new(),
            key_locks: BTreeSet::new(),
            acquire_key_lock: None,
            new_contract_address: String::new(),
        }
    }

    pub fn is_response(&self) -> bool {
        matches!(self.kind, CallKind::Finished | CallKind::Revert)
    }
}

#[cfg(test)]
mod tests {
    use super::{CallKind, CallMessage};
    use crate::{LogEntry, TransactionStatus};
    use ethereum_types::H256;

    /// The message is the only state carried across a suspend/resume
    /// boundary that is not implicit in the suspended call stack, so it has
    /// to survive a serialization round trip without loss.
    #[test]
    fn round_trips_through_serde() {
        let mut message = CallMessage::new(CallKind::Message);
        message.context_id = 7;
        message.seq = 3;
        message.origin = "alice".into();
        message.sender = "alice".into();
        message.receiver = "/apps/counter".into();
        message.code_address = "/apps/counter".into();
        message.gas = -5;
        message.data = vec![1, 2, 3];
        message.status = TransactionStatus::RevertInstruction;
        message.key_locks.insert("balance/alice".into());
        message.key_locks.insert("balance/bob".into());
        message.acquire_key_lock = Some("nonce/alice".into());
        message.log_entries.push(LogEntry {
            address: "/apps/counter".into(),
            topics: vec![H256::repeat_byte(0xab)],
            data: vec![9],
        });

        let encoded = serde_json::to_string(&message).unwrap();
        let decoded: CallMessage = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.kind, CallKind::Message);
        assert_eq!(decoded.context_id, 7);
        assert_eq!(decoded.gas, -5);
        assert_eq!(decoded.key_locks, message.key_locks);
        assert_eq!(decoded.acquire_key_lock, message.acquire_key_lock);
        assert_eq!(decoded.log_entries, message.log_entries);
        assert_eq!(decoded.status, TransactionStatus::RevertInstruction);
    }
}
