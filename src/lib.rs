//! Bounded worker pool with cooperative cancellation.
//!
//! A [`Pool`] runs a fixed list of [`Task`]s on `concurrency` worker threads.
//! A single dispatch loop feeds the tasks in order through a bounded queue
//! and stops early once the pool is cancelled. Workers skip any task they
//! receive after cancellation.
//!
//! [`Pool::run`] returns once dispatch is over, not once every task has
//! finished. Use [`Pool::join`] (or [`Pool::run_to_completion`]) to wait for
//! the workers.

mod builder;
mod cancel;
mod error;
mod inner;
mod task;
mod worker;


pub use builder::PoolBuilder;
pub use cancel::{CancelHandle, CancelToken};
pub use error::PoolError;
pub use task::{Task, TaskOutcome};

use atomic_enum::atomic_enum;
use builder::PoolConfig;
use inner::PoolInner;
use std::{any::Any, error::Error, num::NonZeroUsize, sync::Arc};

/// Pool lifecycle: `Created -> Running -> (Canceled | Drained)`
#[atomic_enum]
#[derive(PartialEq, Eq)]
pub enum PoolState {
    Created,
    Running,
    /// Dispatch halted by cancellation; workers may still be busy
    Canceled,
    /// Every task was dispatched
    Drained,
}

/// Result of a finished dispatch
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Number of tasks handed to the workers
    pub dispatched: usize,
    /// Either [`PoolState::Canceled`] or [`PoolState::Drained`]
    pub state: PoolState,
}

/// Fixed-size, single-use worker pool
pub struct Pool<P>(PoolInner<P>);

impl<P: Send + Sync + 'static> Pool<P> {
    /// Pool builder
    pub fn builder() -> PoolBuilder<P> {
        PoolBuilder::new()
    }

    /// Create a pool running `tasks` on `concurrency` workers with default
    /// settings otherwise
    pub fn new(
        tasks: impl IntoIterator<Item = Arc<Task<P>>>,
        concurrency: usize,
    ) -> Result<Self, PoolError> {
        let concurrency = NonZeroUsize::new(concurrency).ok_or(PoolError::ZeroConcurrency)?;
        Self::builder().concurrency(concurrency).build(tasks)
    }

    /// Dispatch every task to the workers and block until dispatch is over.
    ///
    /// Task failures never surface here. Fails only if the pool was already
    /// run or a worker thread could not be spawned.
    pub fn run(&self) -> Result<RunSummary, PoolError> {
        self.0.run()
    }

    /// Wait for all workers to finish their tasks and exit
    pub fn join(&self) -> Result<(), PoolError> {
        self.0.join().map_err(|_| PoolError::WorkerPanicked)
    }

    /// Run the pool and wait until every dispatched task has finished
    pub fn run_to_completion(&self) -> Result<RunSummary, PoolError> {
        let summary = self.run()?;
        self.join()?;
        Ok(summary)
    }

    /// Stop dispatching. Idempotent and safe to call from any thread, before,
    /// during or after [`Pool::run`].
    pub fn cancel(&self) {
        self.cancel_handle().cancel()
    }

    /// Cancel a pool that may not exist
    pub fn cancel_opt(pool: Option<&Self>) {
        if let Some(pool) = pool {
            pool.cancel();
        }
    }

    /// Handle cancelling this pool, usable after the pool is gone
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle::new(self.0.token().clone())
    }

    pub fn is_canceled(&self) -> bool {
        self.0.token().is_canceled()
    }

    pub fn state(&self) -> PoolState {
        self.0.state()
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        self.0.config().concurrency
    }

    pub fn tasks(&self) -> &[Arc<Task<P>>] {
        self.0.tasks()
    }

    /// Number of workers currently executing a task. Stays accurate while
    /// another thread is blocked in [`Pool::join`].
    pub fn busy_workers(&self) -> usize {
        self.0.busy_workers()
    }

    pub(crate) fn from_config(tasks: Vec<Arc<Task<P>>>, config: PoolConfig) -> Self {
        Self(PoolInner::new(tasks, config))
    }
}

/// Error returned by a task's work function
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Function that handles panics of work functions
pub type PanicHandler = Arc<dyn Fn(Box<dyn Any + Send>) + Send + Sync>;
