use crate::{task::Task, PanicHandler, Pool, PoolError};
use std::{any::Any, marker::PhantomData, num::NonZeroUsize, sync::Arc};

const DEFAULT_THREAD_NAME: &str = "quench-worker";

/// Builder for a [`Pool`] over payloads of type `P`
pub struct PoolBuilder<P> {
    concurrency: Option<NonZeroUsize>,
    queue_capacity: usize,
    thread_name: Option<String>,
    panic_handler: Option<PanicHandler>,
    _payload: PhantomData<fn() -> P>,
}

impl<P> Default for PoolBuilder<P> {
    fn default() -> Self {
        Self {
            concurrency: None,
            queue_capacity: 0,
            thread_name: None,
            panic_handler: None,
            _payload: PhantomData,
        }
    }
}

impl<P: Send + Sync + 'static> PoolBuilder<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of worker threads. Defaults to the number of CPUs.
    pub fn concurrency(mut self, val: NonZeroUsize) -> Self {
        self.concurrency = Some(val);
        self
    }

    /// Capacity of the dispatch queue. With the default of 0 the dispatcher
    /// hands each task directly to a ready worker.
    pub fn queue_capacity(mut self, val: usize) -> Self {
        self.queue_capacity = val;
        self
    }

    /// Name prefix for worker threads
    pub fn thread_name(mut self, val: impl Into<String>) -> Self {
        self.thread_name = Some(val.into());
        self
    }

    /// Panic handler, called with the payload of a panicking work function
    pub fn panic_handler(
        mut self,
        f: impl Fn(Box<dyn Any + Send>) + Send + Sync + 'static,
    ) -> Self {
        self.panic_handler = Some(Arc::new(f));
        self
    }

    pub fn build(self, tasks: impl IntoIterator<Item = Arc<Task<P>>>) -> Result<Pool<P>, PoolError> {
        let concurrency = match self.concurrency {
            Some(val) => val,
            None => default_concurrency()?,
        };

        Ok(Pool::from_config(
            tasks.into_iter().collect(),
            PoolConfig {
                concurrency,
                queue_capacity: self.queue_capacity,
                thread_name: self
                    .thread_name
                    .unwrap_or_else(|| DEFAULT_THREAD_NAME.to_string()),
                panic_handler: self.panic_handler,
            },
        ))
    }
}

/// Settled pool configuration
pub(crate) struct PoolConfig {
    pub(crate) concurrency: NonZeroUsize,
    pub(crate) queue_capacity: usize,
    pub(crate) thread_name: String,
    pub(crate) panic_handler: Option<PanicHandler>,
}

fn default_concurrency() -> Result<NonZeroUsize, PoolError> {
    NonZeroUsize::new(num_cpus::get()).ok_or(PoolError::ZeroConcurrency)
}
