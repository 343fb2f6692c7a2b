use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// One-shot gate marking the end of an exchange.
///
/// Starts pending and is signaled at most once; signaling again is a no-op.
/// Clones share the same gate, so the response sink can hold one copy while
/// any number of waiters hold others.
#[derive(Clone, Debug)]
pub struct CompletionSignal {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    fired: AtomicBool,
    sender: watch::Sender<bool>,
    // Kept so `sender.send` always has a receiver.
    receiver: watch::Receiver<bool>,
}

impl CompletionSignal {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        CompletionSignal {
            inner: Arc::new(Inner {
                fired: AtomicBool::new(false),
                sender,
                receiver,
            }),
        }
    }

    /// Moves the gate to signaled. Returns `true` only for the call that
    /// performed the transition.
    pub fn signal(&self) -> bool {
        if self.inner.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.inner.sender.send(true);
        true
    }

    pub fn is_signaled(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Waits until the gate is signaled.
    pub async fn wait(&self) {
        let mut receiver = self.inner.receiver.clone();
        loop {
            let fired = *receiver.borrow();
            if fired {
                return;
            }
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }

    /// Waits until the gate is signaled or `timeout` elapses, returning
    /// whether the gate was signaled. A zero timeout only probes.
    pub async fn await_until(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.wait()).await.is_ok()
    }
}

impl Default for CompletionSignal {
    fn default() -> Self {
        Self::new()
    }
}
