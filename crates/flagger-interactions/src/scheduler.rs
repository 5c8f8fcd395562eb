//! Delayed-task scheduling.
//!
//! Confirmation timeouts and free-text capture expiry both run a task after a
//! delay unless they are cancelled first. `TokioScheduler` backs production;
//! `ManualScheduler` lets tests fire timers on demand and observe
//! cancellations.

use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use futures_util::future::BoxFuture;

/// Work executed when a timer fires.
pub type ScheduledTask = BoxFuture<'static, ()>;

/// Trait contract for running a task after a delay.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle;
}

/// Cancellation handle for a scheduled task.
///
/// Dropping the handle does not cancel the task.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Handle with nothing to cancel.
    pub fn detached() -> Self {
        Self { cancel: None }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
/// Scheduler that spawns one sleeping task per timer on a tokio runtime.
pub struct TokioScheduler {
    runtime: tokio::runtime::Handle,
}

impl TokioScheduler {
    pub fn new(runtime: tokio::runtime::Handle) -> Self {
        Self { runtime }
    }

    /// Binds to the runtime of the calling task. Panics outside a runtime.
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        TimerHandle::new(move || handle.abort())
    }
}

struct ManualTimer {
    id: u64,
    delay: Duration,
    task: ScheduledTask,
}

#[derive(Default)]
struct ManualSchedulerState {
    next_id: u64,
    timers: Vec<ManualTimer>,
    scheduled: usize,
    cancelled: usize,
}

#[derive(Clone, Default)]
/// Scheduler whose timers only fire when a test says so.
pub struct ManualScheduler {
    state: Arc<Mutex<ManualSchedulerState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualSchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timers scheduled and neither fired nor cancelled.
    pub fn pending(&self) -> usize {
        self.lock().timers.len()
    }

    pub fn pending_delays(&self) -> Vec<Duration> {
        self.lock().timers.iter().map(|timer| timer.delay).collect()
    }

    pub fn scheduled_count(&self) -> usize {
        self.lock().scheduled
    }

    pub fn cancelled_count(&self) -> usize {
        self.lock().cancelled
    }

    /// Fires the oldest pending timer. Returns `false` when none is pending.
    pub async fn fire_next(&self) -> bool {
        let timer = {
            let mut state = self.lock();
            if state.timers.is_empty() {
                return false;
            }
            state.timers.remove(0)
        };
        timer.task.await;
        true
    }

    /// Fires every timer pending at call time, oldest first.
    pub async fn fire_all(&self) -> usize {
        let timers = std::mem::take(&mut self.lock().timers);
        let fired = timers.len();
        for timer in timers {
            timer.task.await;
        }
        fired
    }

    /// Detaches the oldest pending timer's task without running it.
    pub fn take_next(&self) -> Option<ScheduledTask> {
        let mut state = self.lock();
        if state.timers.is_empty() {
            return None;
        }
        Some(state.timers.remove(0).task)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: ScheduledTask) -> TimerHandle {
        let id = {
            let mut state = self.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.scheduled += 1;
            state.timers.push(ManualTimer { id, delay, task });
            id
        };
        let state = Arc::clone(&self.state);
        TimerHandle::new(move || {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.cancelled += 1;
            state.timers.retain(|timer| timer.id != id);
        })
    }
}
