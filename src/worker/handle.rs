use super::AtomicWorkerState;
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

/// Handle for managing a worker
pub(crate) struct WorkerHandle {
    thread_handle: JoinHandle<()>,
    state: Arc<AtomicWorkerState>,
}

impl WorkerHandle {
    pub(crate) fn new(thread_handle: JoinHandle<()>, state: Arc<AtomicWorkerState>) -> Self {
        Self {
            thread_handle,
            state,
        }
    }

    /// Shared state of the worker, readable after the handle is joined
    pub(crate) fn state(&self) -> Arc<AtomicWorkerState> {
        Arc::clone(&self.state)
    }

    /// Wait for the worker to drain the queue and exit
    pub(crate) fn join(self) -> thread::Result<()> {
        self.thread_handle.join()
    }
}
