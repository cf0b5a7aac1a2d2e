use crate::{cancel::CancelToken, BoxError};
use parking_lot::Mutex;
use std::{
    any::Any,
    error::Error,
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};

/// Work function of a task
type Work<P> = Box<dyn FnOnce(&P) -> Result<(), BoxError> + Send>;

/// What happened to a task
#[derive(Clone)]
pub enum TaskOutcome {
    /// Not executed (yet). Tasks the pool never dispatched stay here.
    Pending,
    Succeeded,
    /// The work function returned an error
    Failed(Arc<dyn Error + Send + Sync>),
    /// A worker received the task after cancellation and skipped it
    Canceled,
    /// The work function panicked with the given message
    Panicked(String),
}

impl TaskOutcome {
    /// Whether the task reached a final outcome
    pub fn is_finished(&self) -> bool {
        !matches!(self, TaskOutcome::Pending)
    }
}

impl fmt::Debug for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Pending => f.write_str("Pending"),
            TaskOutcome::Succeeded => f.write_str("Succeeded"),
            TaskOutcome::Failed(err) => f.debug_tuple("Failed").field(&err.to_string()).finish(),
            TaskOutcome::Canceled => f.write_str("Canceled"),
            TaskOutcome::Panicked(msg) => f.debug_tuple("Panicked").field(msg).finish(),
        }
    }
}

/// A unit of work: a payload plus the function that processes it.
///
/// Tasks are shared through `Arc` between the caller and the pool, so the
/// caller can read the outcome once the pool is done with it. The outcome is
/// only meaningful after the task has been executed; see [`crate::Pool::join`].
pub struct Task<P> {
    payload: P,
    work: Mutex<Option<Work<P>>>,
    outcome: Mutex<TaskOutcome>,
}

impl<P> Task<P> {
    pub fn new(
        payload: P,
        work: impl FnOnce(&P) -> Result<(), BoxError> + Send + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            payload,
            work: Mutex::new(Some(Box::new(work))),
            outcome: Mutex::new(TaskOutcome::Pending),
        })
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn outcome(&self) -> TaskOutcome {
        self.outcome.lock().clone()
    }

    pub fn is_pending(&self) -> bool {
        !self.outcome.lock().is_finished()
    }

    /// Error returned by the work function, if it failed
    pub fn error(&self) -> Option<Arc<dyn Error + Send + Sync>> {
        match &*self.outcome.lock() {
            TaskOutcome::Failed(err) => Some(Arc::clone(err)),
            _ => None,
        }
    }

    /// Run the work function unless `token` is already cancelled.
    ///
    /// The work function is consumed on the first call; any later call is a
    /// no-op. A panic inside the work is recorded as [`TaskOutcome::Panicked`]
    /// and its payload handed back to the caller.
    pub fn execute(&self, token: &CancelToken) -> thread::Result<()> {
        let Some(work) = self.work.lock().take() else {
            return Ok(());
        };

        if token.is_canceled() {
            tracing::trace!("cancellation already signalled, skipping task");
            *self.outcome.lock() = TaskOutcome::Canceled;
            return Ok(());
        }

        let (outcome, result) = match panic::catch_unwind(AssertUnwindSafe(|| work(&self.payload)))
        {
            Ok(Ok(())) => (TaskOutcome::Succeeded, Ok(())),
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "task failed");
                (TaskOutcome::Failed(Arc::from(err)), Ok(()))
            }
            Err(panic) => (TaskOutcome::Panicked(panic_message(&*panic)), Err(panic)),
        };

        *self.outcome.lock() = outcome;
        result
    }
}

impl<P: fmt::Debug> fmt::Debug for Task<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("payload", &self.payload)
            .field("outcome", &*self.outcome.lock())
            .finish()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
