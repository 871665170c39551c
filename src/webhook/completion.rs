//! Single-use completion signal between a poll invocation and its host.
//!
//! [`completion_pair`] returns a producer ([`CompletionSignal`]) handed to
//! the poller and a consumer ([`CompletionWait`]) kept by the host. Both
//! halves are consumed by their only operation, so firing twice or waiting
//! twice does not compile.

use tokio::sync::oneshot;
use tracing::debug;

/// How a [`CompletionWait`] was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The poller fired the signal.
    Signaled,
    /// The signal was dropped without firing.
    Abandoned,
}

/// Producer half. Fire it once when the invocation's work is done.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<()>,
}

/// Consumer half held by the host.
#[derive(Debug)]
pub struct CompletionWait {
    rx: oneshot::Receiver<()>,
}

/// Create a connected signal/wait pair.
pub fn completion_pair() -> (CompletionSignal, CompletionWait) {
    let (tx, rx) = oneshot::channel();
    (CompletionSignal { tx }, CompletionWait { rx })
}

impl CompletionSignal {
    /// Release the waiting host.
    pub fn fire(self) {
        if self.tx.send(()).is_err() {
            debug!("completion fired after the waiter went away");
        }
    }
}

impl CompletionWait {
    /// Wait until the signal fires or is dropped unfired.
    pub async fn wait(self) -> Completion {
        match self.rx.await {
            Ok(()) => Completion::Signaled,
            Err(_) => Completion::Abandoned,
        }
    }

    /// Blocking variant of [`wait`](Self::wait) for hosts outside a runtime.
    ///
    /// # Panics
    ///
    /// Panics when called from within an async execution context.
    pub fn blocking_wait(self) -> Completion {
        match self.rx.blocking_recv() {
            Ok(()) => Completion::Signaled,
            Err(_) => Completion::Abandoned,
        }
    }
}
