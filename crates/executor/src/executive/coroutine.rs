// Copyright 2023 Basalt Foundation. All rights reserved.
// Basalt is free software and distributed under GNU General Public License.
// See http://www.gnu.org/licenses/

use crate::error::ExecutorError;
use basalt_vm_types::CallMessage;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// What the executive side hands to its driver.
pub(crate) enum Yielded {
    /// A suspension point: the executive wants a nested call or a key lock
    /// and parks until the driver feeds the outcome back.
    Request(CallMessage),
    /// The top-level call returned; the coroutine is finished.
    Complete(Result<CallMessage, ExecutorError>),
}

/// The executive-side half of the suspend/resume pair. `suspend` trades a
/// request for a response, parking the executive thread in between.
pub struct Suspender {
    yield_tx: Sender<Yielded>,
    resume_rx: Receiver<CallMessage>,
}

impl Suspender {
    pub(crate) fn new(
        yield_tx: Sender<Yielded>, resume_rx: Receiver<CallMessage>,
    ) -> Suspender {
        Suspender {
            yield_tx,
            resume_rx,
        }
    }

    /// Hands `request` to the driver and parks until it responds. The
    /// driver owning the other half must not go away while the executive
    /// is suspended; that is a protocol violation, not a recoverable
    /// condition.
    pub(crate) fn suspend(&self, request: CallMessage) -> CallMessage {
        self.yield_tx
            .send(Yielded::Request(request))
            .expect("executive driver disconnected while suspending");
        self.resume_rx
            .recv()
            .expect("executive driver disconnected while suspended")
    }
}

/// A dedicated thread running one executive, parked on zero-capacity
/// channels at every suspension point. The zero capacity is what enforces
/// strict alternation: neither side can run ahead of the other.
pub(crate) struct ExecutiveCoroutine {
    yield_rx: Receiver<Yielded>,
    resume_tx: Sender<CallMessage>,
    thread: Option<JoinHandle<()>>,
}

impl ExecutiveCoroutine {
    pub(crate) fn spawn<F>(body: F) -> Result<ExecutiveCoroutine, ExecutorError>
    where F: FnOnce(Suspender) -> Result<CallMessage, ExecutorError>
            + Send
            + 'static {
        let (yield_tx, yield_rx) = bounded(0);
        let (resume_tx, resume_rx) = bounded(0);
        let thread = thread::Builder::new()
            .name("basalt-executive".into())
            .spawn(move || {
                let suspender = Suspender::new(yield_tx.clone(), resume_rx);
                let outcome = body(suspender);
                // the driver may already be gone on shutdown paths
                let _ = yield_tx.send(Yielded::Complete(outcome));
            })
            .map_err(|err| ExecutorError::ThreadSpawn(err.to_string()))?;
        Ok(ExecutiveCoroutine {
            yield_rx,
            resume_tx,
            thread: Some(thread),
        })
    }

    /// Waits for the next suspension point or the final result.
    pub(crate) fn next_yield(&mut self) -> Result<CallMessage, ExecutorError> {
        match self.yield_rx.recv() {
            Ok(Yielded::Request(message)) => Ok(message),
            Ok(Yielded::Complete(outcome)) => {
                self.join();
                outcome
            }
            Err(_) => {
                self.join();
                Err(ExecutorError::ExecutiveCrashed)
            }
        }
    }

    /// Feeds the outcome of the suspended request back to the executive.
    pub(crate) fn feed(
        &mut self, response: CallMessage,
    ) -> Result<(), ExecutorError> {
        self.resume_tx
            .send(response)
            .map_err(|_| ExecutorError::ExecutiveCrashed)
    }

    fn join(&mut self) {
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
