//! Virtual-time scheduler for deterministic tests of time-based operators.
//!
//! Time only moves when the test says so. Tasks due at the same instant run
//! in the order they were scheduled.
//!
//! ```rust
//! use rxcore::prelude::*;
//! use std::{cell::RefCell, rc::Rc};
//!
//! let scheduler = TestScheduler::new();
//! let seen = Rc::new(RefCell::new(vec![]));
//! let s = seen.clone();
//! observable::of(42)
//!   .delay(Duration::from_millis(100), scheduler.clone())
//!   .subscribe(move |v| s.borrow_mut().push(v));
//!
//! scheduler.advance_by(Duration::from_millis(99));
//! assert!(seen.borrow().is_empty());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert_eq!(*seen.borrow(), vec![42]);
//! ```

use super::{Duration, Scheduler, TaskHandle};
use crate::{rc::MutRc, subscription::Subscription};
use std::{cmp::Ordering, collections::BinaryHeap};
use tracing::trace;

enum TaskFn {
  Once(Box<dyn FnOnce()>),
  Periodic { task: Box<dyn FnMut(usize) -> bool>, period: Duration, tick: usize },
}

struct ScheduledTask {
  scheduled_time: Duration,
  task_id: usize,
  task: TaskFn,
  handle: TaskHandle,
}

impl PartialEq for ScheduledTask {
  fn eq(&self, other: &Self) -> bool {
    self.scheduled_time == other.scheduled_time && self.task_id == other.task_id
  }
}

impl Eq for ScheduledTask {}

impl PartialOrd for ScheduledTask {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for ScheduledTask {
  fn cmp(&self, other: &Self) -> Ordering {
    // Min-heap: earlier times first, then FIFO by task_id
    other
      .scheduled_time
      .cmp(&self.scheduled_time)
      .then_with(|| other.task_id.cmp(&self.task_id))
  }
}

#[derive(Default)]
struct TestSchedulerState {
  virtual_time: Duration,
  task_queue: BinaryHeap<ScheduledTask>,
  next_task_id: usize,
}

impl TestSchedulerState {
  fn push(&mut self, scheduled_time: Duration, task: TaskFn, handle: TaskHandle) {
    let task_id = self.next_task_id;
    self.next_task_id += 1;
    self.task_queue.push(ScheduledTask { scheduled_time, task_id, task, handle });
  }
}

/// A virtual time scheduler. Clones share one clock and one task queue.
#[derive(Clone, Default)]
pub struct TestScheduler(MutRc<TestSchedulerState>);

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// Advance the clock by `duration`, running every task that falls due on
  /// the way, in due-time order.
  pub fn advance_by(&self, duration: Duration) {
    let target = self.now() + duration;
    self.advance_to(target);
  }

  /// Advance the clock to the absolute virtual time `target`. Moving
  /// backwards is a no-op.
  pub fn advance_to(&self, target: Duration) {
    trace!(?target, "advancing virtual time");
    self.run_until(Some(target));
    let mut state = self.0.rc_deref_mut();
    if state.virtual_time < target {
      state.virtual_time = target;
    }
  }

  /// Run tasks until the queue is empty, moving the clock to each task's due
  /// time. Periodic tasks keep the queue non-empty, so prefer `advance_by`
  /// while they are active.
  pub fn flush(&self) { self.run_until(None) }

  /// Number of tasks waiting to run, cancelled ones excluded.
  pub fn pending_count(&self) -> usize {
    self.0.rc_deref().task_queue.iter().filter(|t| !t.handle.is_closed()).count()
  }

  fn run_until(&self, target: Option<Duration>) {
    loop {
      // Pop under the borrow, run after releasing it: tasks schedule more
      // work on this same scheduler.
      let next = {
        let mut state = self.0.rc_deref_mut();
        let due = match state.task_queue.peek() {
          Some(task) => target.map_or(true, |t| task.scheduled_time <= t),
          None => false,
        };
        if !due {
          return;
        }
        let task = state.task_queue.pop();
        if let Some(task) = &task {
          if state.virtual_time < task.scheduled_time {
            state.virtual_time = task.scheduled_time;
          }
        }
        task
      };
      let Some(ScheduledTask { scheduled_time, task, handle, .. }) = next else {
        return;
      };
      if !handle.begin() {
        continue;
      }
      match task {
        TaskFn::Once(task) => {
          task();
          handle.finish();
        }
        TaskFn::Periodic { mut task, period, tick } => {
          let again = task(tick);
          if again && !handle.is_closed() {
            handle.suspend();
            let task = TaskFn::Periodic { task, period, tick: tick + 1 };
            self.0.rc_deref_mut().push(scheduled_time + period, task, handle);
          } else {
            handle.finish();
          }
        }
      }
    }
  }
}

impl Scheduler for TestScheduler {
  fn now(&self) -> Duration { self.0.rc_deref().virtual_time }

  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + 'static,
  {
    let handle = TaskHandle::new();
    let mut state = self.0.rc_deref_mut();
    let due = state.virtual_time + delay.unwrap_or_default();
    state.push(due, TaskFn::Once(Box::new(task)), handle.clone());
    handle
  }

  fn schedule_periodic<F>(&self, task: F, period: Duration, delay: Option<Duration>) -> TaskHandle
  where
    F: FnMut(usize) -> bool + 'static,
  {
    let handle = TaskHandle::new();
    let mut state = self.0.rc_deref_mut();
    let due = state.virtual_time + delay.unwrap_or(period);
    let task = TaskFn::Periodic { task: Box::new(task), period, tick: 0 };
    state.push(due, task, handle.clone());
    handle
  }
}
