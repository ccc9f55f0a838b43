//! Trailing-edge debouncing of asynchronous work.

use std::{
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{task::JoinHandle, time::sleep};

/// Collapses a burst of scheduled tasks into a single run after a quiet period.
///
/// Every call to [`Debouncer::schedule`] restarts the timer and replaces the pending task;
/// only the last task of a burst runs. There is no leading-edge run. Dropping the debouncer
/// cancels whatever is pending.
#[derive(Debug)]
pub struct Debouncer {
    quiet_period: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    #[must_use]
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: Mutex::new(None),
        }
    }

    /// The quiet period.
    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Run `task` once the quiet period elapses without another call.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let quiet_period = self.quiet_period;

        let handle = tokio::spawn(async move {
            sleep(quiet_period).await;
            task.await;
        });

        if let Some(previous) = self.pending().replace(handle) {
            previous.abort();
        }
    }

    /// Abort the pending task, if any.
    pub fn cancel(&self) {
        if let Some(handle) = self.pending().take() {
            handle.abort();
        }
    }

    /// Whether a task is waiting for, or running after, its quiet period.
    pub fn is_pending(&self) -> bool {
        self.pending()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn pending(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
