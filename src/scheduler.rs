//! Schedulers decide *when* deferred work runs.
//!
//! Every time-based operator takes its scheduler as an argument, so the same
//! pipeline runs against the real clock in production and against the
//! virtual [`TestScheduler`] in tests.

use crate::{rc::MutRc, subscription::Subscription};
use futures::future::AbortHandle;
pub use std::time::Duration;

mod test_scheduler;
pub use test_scheduler::TestScheduler;

#[cfg(feature = "futures-scheduler")]
mod local_spawner;

#[cfg(feature = "tokio-scheduler")]
mod tokio_scheduler;
#[cfg(feature = "tokio-scheduler")]
pub use tokio_scheduler::TokioScheduler;

/// A Scheduler orders tasks and schedules their execution.
///
/// Implementations are cheap handles (`Clone`) onto a shared timer queue or
/// executor.
pub trait Scheduler: Clone + 'static {
  /// Time elapsed since this scheduler's origin.
  fn now(&self) -> Duration;

  /// Run `task` once, after `delay` (or as soon as possible for `None`).
  ///
  /// Cancelling the returned handle before the task starts guarantees it
  /// never runs.
  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + 'static;

  /// Run `task` every `period`, starting after `delay` (or after one period
  /// for `None`). The task receives the zero-based tick index and returns
  /// `false` to stop repeating.
  fn schedule_periodic<F>(&self, task: F, period: Duration, delay: Option<Duration>) -> TaskHandle
  where
    F: FnMut(usize) -> bool + 'static;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
  Pending,
  Running,
  Finished,
  Cancelled,
}

struct HandleInner {
  status: TaskStatus,
  abort: Option<AbortHandle>,
}

/// Cancellable handle to a scheduled task. Cloning shares the handle.
#[derive(Clone)]
pub struct TaskHandle(MutRc<HandleInner>);

impl TaskHandle {
  pub fn new() -> Self {
    TaskHandle(MutRc::own(HandleInner { status: TaskStatus::Pending, abort: None }))
  }

  /// A handle for work that has already completed.
  pub fn finished() -> Self {
    let handle = Self::new();
    handle.finish();
    handle
  }

  pub fn status(&self) -> TaskStatus { self.0.rc_deref().status }

  /// Attach the executor-side abort handle of the future driving this task.
  pub(crate) fn set_abort(&self, abort: AbortHandle) {
    let mut inner = self.0.rc_deref_mut();
    if inner.status == TaskStatus::Cancelled {
      abort.abort();
    } else {
      inner.abort = Some(abort);
    }
  }

  /// Mark the task as starting to run. Returns `false` if it was cancelled.
  pub(crate) fn begin(&self) -> bool {
    let mut inner = self.0.rc_deref_mut();
    match inner.status {
      TaskStatus::Pending | TaskStatus::Running => {
        inner.status = TaskStatus::Running;
        true
      }
      TaskStatus::Finished | TaskStatus::Cancelled => false,
    }
  }

  /// A periodic task goes back to waiting between ticks.
  pub(crate) fn suspend(&self) {
    let mut inner = self.0.rc_deref_mut();
    if inner.status == TaskStatus::Running {
      inner.status = TaskStatus::Pending;
    }
  }

  pub(crate) fn finish(&self) {
    let mut inner = self.0.rc_deref_mut();
    if inner.status != TaskStatus::Cancelled {
      inner.status = TaskStatus::Finished;
    }
    inner.abort = None;
  }
}

impl Default for TaskHandle {
  fn default() -> Self { Self::new() }
}

impl Subscription for TaskHandle {
  fn unsubscribe(self) {
    let abort = {
      let mut inner = self.0.rc_deref_mut();
      match inner.status {
        TaskStatus::Pending | TaskStatus::Running => {
          inner.status = TaskStatus::Cancelled;
          inner.abort.take()
        }
        TaskStatus::Finished | TaskStatus::Cancelled => None,
      }
    };
    if let Some(abort) = abort {
      abort.abort();
    }
  }

  fn is_closed(&self) -> bool {
    matches!(self.status(), TaskStatus::Finished | TaskStatus::Cancelled)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn handle_lifecycle() {
    let handle = TaskHandle::new();
    assert!(!handle.is_closed());
    assert!(handle.begin());
    handle.suspend();
    assert_eq!(handle.status(), TaskStatus::Pending);
    handle.clone().unsubscribe();
    assert_eq!(handle.status(), TaskStatus::Cancelled);
    assert!(!handle.begin());
    handle.finish();
    assert_eq!(handle.status(), TaskStatus::Cancelled);
    assert!(TaskHandle::finished().is_closed());
  }
}
