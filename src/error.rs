use crate::PoolState;
use std::io;
use thiserror::Error;

/// Errors returned by the pool itself. Failures of individual tasks are
/// stored on the task and never show up here.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("pool concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("pool is single-use and has already been run (state: {0:?})")]
    AlreadyRun(PoolState),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),

    #[error("worker thread panicked")]
    WorkerPanicked,
}
