use crate::{
    builder::PoolConfig,
    cancel::CancelToken,
    task::Task,
    worker::{self, handle::WorkerHandle, AtomicWorkerState, Worker},
    AtomicPoolState, PoolError, PoolState, RunSummary,
};
use crossbeam::channel::{self, select, Sender};
use parking_lot::Mutex;
use std::{
    io,
    sync::{atomic::Ordering, Arc},
    thread,
};

pub(crate) struct PoolInner<P> {
    tasks: Vec<Arc<Task<P>>>,
    config: PoolConfig,
    token: CancelToken,
    state: AtomicPoolState,
    workers: Mutex<Vec<WorkerHandle>>,
    worker_states: Mutex<Vec<Arc<AtomicWorkerState>>>,
}

impl<P: Send + Sync + 'static> PoolInner<P> {
    pub(crate) fn new(tasks: Vec<Arc<Task<P>>>, config: PoolConfig) -> Self {
        Self {
            tasks,
            config,
            token: CancelToken::new(),
            state: AtomicPoolState::new(PoolState::Created),
            workers: Mutex::new(Vec::new()),
            worker_states: Mutex::new(Vec::new()),
        }
    }

    /// Start the workers, feed them every task in order and close the queue.
    /// Returns as soon as dispatch is over, without waiting for the workers.
    pub(crate) fn run(&self) -> Result<RunSummary, PoolError> {
        if let Err(state) = self.state.compare_exchange(
            PoolState::Created,
            PoolState::Running,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            return Err(PoolError::AlreadyRun(state));
        }

        let concurrency = self.config.concurrency.get();
        tracing::info!(
            tasks = self.tasks.len(),
            concurrency,
            queue_capacity = self.config.queue_capacity,
            "starting pool"
        );

        let (tx, rx) = channel::bounded(self.config.queue_capacity);

        {
            let mut workers = self.workers.lock();
            let mut states = self.worker_states.lock();
            workers.reserve(concurrency);
            states.reserve(concurrency);

            for idx in 0..concurrency {
                let worker = Worker::new(
                    idx,
                    rx.clone(),
                    self.token.clone(),
                    self.config.panic_handler.clone(),
                );

                match worker.run(&self.config.thread_name) {
                    Ok(handle) => {
                        states.push(handle.state());
                        workers.push(handle);
                    }
                    Err(err) => {
                        // Dropping the sender lets the workers already started exit
                        drop(tx);
                        return Err(self.abort_spawn(idx, err));
                    }
                }
            }
        }

        drop(rx);

        let (dispatched, state) = self.dispatch(tx);
        self.state.store(state, Ordering::Release);

        Ok(RunSummary { dispatched, state })
    }

    /// Give up on a run whose worker `idx` could not be started. The pool
    /// ends up cancelled, in state and in signal.
    fn abort_spawn(&self, idx: usize, err: io::Error) -> PoolError {
        tracing::error!(worker = idx, error = %err, "failed to spawn worker");
        self.token.cancel();
        self.state.store(PoolState::Canceled, Ordering::Release);
        PoolError::Spawn(err)
    }

    /// Dispatch loop. The queue closes when `tx` is dropped on return.
    fn dispatch(&self, tx: Sender<Arc<Task<P>>>) -> (usize, PoolState) {
        let mut dispatched = 0;

        for (idx, task) in self.tasks.iter().enumerate() {
            if self.token.is_canceled() {
                return self.halt(dispatched);
            }

            // Either the token fires while we wait for a free worker, or every
            // worker is gone. Both end dispatch.
            let sent = select! {
                send(tx, Arc::clone(task)) -> res => res.is_ok(),
                recv(self.token.receiver()) -> _ => false,
            };

            if !sent {
                return self.halt(dispatched);
            }

            tracing::trace!(task = idx, "task dispatched");
            dispatched += 1;
        }

        tracing::info!(dispatched, "dispatch drained");
        (dispatched, PoolState::Drained)
    }

    fn halt(&self, dispatched: usize) -> (usize, PoolState) {
        tracing::info!(
            dispatched,
            remaining = self.tasks.len() - dispatched,
            "pool canceled, dispatch halted"
        );
        (dispatched, PoolState::Canceled)
    }

    /// Wait for every worker thread to exit. A panicked worker does not stop
    /// the others from being joined; the first panic is returned at the end.
    pub(crate) fn join(&self) -> thread::Result<()> {
        let workers = std::mem::take(&mut *self.workers.lock());
        let mut result = Ok(());

        for wh in workers {
            if let Err(err) = wh.join() {
                tracing::warn!("worker thread panicked");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        result
    }

    pub(crate) fn busy_workers(&self) -> usize {
        self.worker_states
            .lock()
            .iter()
            .filter(|s| worker::is_busy(s))
            .count()
    }

    pub(crate) fn token(&self) -> &CancelToken {
        &self.token
    }

    pub(crate) fn state(&self) -> PoolState {
        self.state.load(Ordering::Acquire)
    }

    pub(crate) fn tasks(&self) -> &[Arc<Task<P>>] {
        &self.tasks
    }

    pub(crate) fn config(&self) -> &PoolConfig {
        &self.config
    }
}
