// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

//! The per-transaction call-stack coordinator. A [`TransactionExecutive`]
//! runs one transaction's top-level call and any nested calls as a single
//! unit of suspendable work: whenever the code needs another contract or a
//! key lock, the executive packages a `CallMessage` and parks until its
//! driver feeds the outcome back. Control strictly alternates between the
//! executive and its driver; they never run concurrently.

mod coroutine;
mod state;
mod transaction_executive;

pub use state::{ExecutiveFactory, ExecutiveState, ExecutiveStatus};
pub use transaction_executive::TransactionExecutive;
