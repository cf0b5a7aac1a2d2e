pub(crate) mod handle;

use crate::{cancel::CancelToken, task::Task, PanicHandler};
use atomic_enum::atomic_enum;
use crossbeam::channel::Receiver;
use handle::WorkerHandle;
use std::{
    io,
    sync::{atomic::Ordering, Arc},
    thread,
};

#[atomic_enum]
pub(crate) enum WorkerState {
    Idle,
    Busy,
    Exited,
}

/// Check if a worker is in the middle of a task
pub(crate) fn is_busy(state: &AtomicWorkerState) -> bool {
    matches!(state.load(Ordering::Acquire), WorkerState::Busy)
}

/// A worker executing tasks on a dedicated thread
pub(crate) struct Worker<P> {
    idx: usize,
    queue: Receiver<Arc<Task<P>>>,
    token: CancelToken,
    panic_handler: Option<PanicHandler>,
    state: Arc<AtomicWorkerState>,
}

impl<P: Send + Sync + 'static> Worker<P> {
    pub(crate) fn new(
        idx: usize,
        queue: Receiver<Arc<Task<P>>>,
        token: CancelToken,
        panic_handler: Option<PanicHandler>,
    ) -> Self {
        Self {
            idx,
            queue,
            token,
            panic_handler,
            state: Arc::new(AtomicWorkerState::new(WorkerState::Idle)),
        }
    }

    /// Start the worker on a thread named `{name}-{idx}`
    pub(crate) fn run(self, name: &str) -> io::Result<WorkerHandle> {
        let state = Arc::clone(&self.state);

        let thread_handle = thread::Builder::new()
            .name(format!("{name}-{}", self.idx))
            .spawn(move || self.worker_loop())?;

        Ok(WorkerHandle::new(thread_handle, state))
    }

    /// Worker execution loop. Ends once the queue is closed and drained.
    fn worker_loop(self) {
        for task in self.queue.iter() {
            self.state.store(WorkerState::Busy, Ordering::Release);

            // Execute the task and handle potential panics
            let result = task.execute(&self.token);
            self.state.store(WorkerState::Idle, Ordering::Release);

            if let Err(err) = result {
                tracing::warn!(worker = self.idx, "task panicked");
                if let Some(ph) = &self.panic_handler {
                    ph(err)
                }
            };
        }

        self.state.store(WorkerState::Exited, Ordering::Release);
        tracing::debug!(worker = self.idx, "task queue closed, worker exiting");
    }
}
