use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::Arc;

/// One-shot broadcast cancellation signal.
///
/// Nothing is ever sent through the underlying channel. Cancelling drops the
/// only sender, after which every receiver observes a disconnected channel:
/// `try_recv` stops reporting `Empty` and any `recv` or `select!` blocked on it
/// returns at once.
#[derive(Clone)]
pub struct CancelToken {
    signal: Arc<Mutex<Option<Sender<()>>>>,
    receiver: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = channel::bounded(0);

        Self {
            signal: Arc::new(Mutex::new(Some(tx))),
            receiver: rx,
        }
    }

    /// Signal cancellation. Returns `true` only for the call that actually
    /// fired the signal; later calls do nothing.
    pub fn cancel(&self) -> bool {
        match self.signal.lock().take() {
            Some(tx) => {
                drop(tx);
                true
            }
            None => false,
        }
    }

    /// Check whether the signal has fired without blocking
    pub fn is_canceled(&self) -> bool {
        matches!(self.receiver.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Receiver side of the signal, for use in `select!`. A receive operation
    /// on it becomes ready once the token is cancelled.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.receiver
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle that cancels a pool from any thread, independently of the pool's
/// own lifetime. Cancelling through it after the pool has finished is harmless.
#[derive(Clone)]
pub struct CancelHandle {
    token: CancelToken,
}

impl CancelHandle {
    pub(crate) fn new(token: CancelToken) -> Self {
        Self { token }
    }

    pub fn cancel(&self) {
        if self.token.cancel() {
            tracing::debug!("cancellation signalled");
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_canceled()
    }
}
