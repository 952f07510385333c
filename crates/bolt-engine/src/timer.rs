//! One-shot timers as owned handles.
//!
//! A [`TimerHandle`] owns a spawned task that sleeps and then runs its
//! expiry future. Dropping or cancelling the handle aborts the task, so a
//! slot holding `Option<TimerHandle>` can never leak a pending callback.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

#[derive(Debug)]
pub(crate) struct TimerHandle {
    id: u64,
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Spawn `on_expiry` to run after `delay`. `id` lets the expiry confirm
    /// it is still the armed timer before acting.
    pub(crate) fn arm<F>(id: u64, delay: Duration, on_expiry: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            on_expiry.await;
        });
        Self {
            id,
            task: Some(task),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Give up the handle without aborting. Used by an expiry to vacate its
    /// own slot; aborting there would cancel the running expiry.
    pub(crate) fn release(mut self) {
        self.task.take();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
