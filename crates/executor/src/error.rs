// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::{storage::StorageError, vm::VmKind};
use thiserror::Error;

/// Configuration and precondition failures surfaced at the driver API.
/// They indicate a caller bug rather than a transaction outcome and are
/// never folded into a `CallMessage`.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("block context was dropped before execution finished")]
    BlockContextDropped,

    #[error("executive thread terminated unexpectedly")]
    ExecutiveCrashed,

    #[error("failed to spawn executive thread: {0}")]
    ThreadSpawn(String),

    #[error("operation not valid while the executive is {0:?}")]
    InvalidState(crate::executive::ExecutiveStatus),

    #[error("no interpreter registered for {0:?}")]
    NoEngine(VmKind),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
