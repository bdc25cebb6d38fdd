use super::{Duration, Scheduler, TaskHandle};
use futures::{
  executor::LocalSpawner,
  future::{abortable, FutureExt},
  task::LocalSpawnExt,
};
use once_cell::sync::Lazy;
use std::{future::Future, time::Instant};
use tracing::{trace, warn};

static CLOCK_ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

async fn sleep(d: Duration) {
  futures_time::task::sleep(futures_time::time::Duration::from(d)).await;
}

fn spawn_abortable<Fut>(spawner: &LocalSpawner, handle: &TaskHandle, fut: Fut)
where
  Fut: Future<Output = ()> + 'static,
{
  let (fut, abort) = abortable(fut);
  handle.set_abort(abort);
  if let Err(e) = spawner.spawn_local(fut.map(|_| ())) {
    warn!(error = %e, "failed to spawn scheduled task");
    handle.finish();
  }
}

/// The real-clock scheduler: tasks run on the `LocalPool` that owns the
/// spawner, timers come from `futures-time`.
impl Scheduler for LocalSpawner {
  fn now(&self) -> Duration { CLOCK_ORIGIN.elapsed() }

  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + 'static,
  {
    trace!(?delay, "scheduling task on local spawner");
    let handle = TaskHandle::new();
    let h = handle.clone();
    spawn_abortable(self, &handle, async move {
      if let Some(d) = delay {
        sleep(d).await;
      }
      if h.begin() {
        task();
        h.finish();
      }
    });
    handle
  }

  fn schedule_periodic<F>(&self, mut task: F, period: Duration, delay: Option<Duration>) -> TaskHandle
  where
    F: FnMut(usize) -> bool + 'static,
  {
    trace!(?period, ?delay, "scheduling periodic task on local spawner");
    let handle = TaskHandle::new();
    let h = handle.clone();
    spawn_abortable(self, &handle, async move {
      sleep(delay.unwrap_or(period)).await;
      let mut tick = 0;
      while h.begin() {
        if !task(tick) {
          break;
        }
        h.suspend();
        tick += 1;
        sleep(period).await;
      }
      h.finish();
    });
    handle
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::subscription::Subscription;
  use futures::executor::LocalPool;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn delayed_and_periodic_tasks_run_on_pool() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let log = Rc::new(RefCell::new(vec![]));

    let l = log.clone();
    spawner.schedule(move || l.borrow_mut().push(100), Some(Duration::from_millis(5)));
    let l = log.clone();
    spawner.schedule_periodic(
      move |i| {
        l.borrow_mut().push(i);
        i < 2
      },
      Duration::from_millis(1),
      Some(Duration::ZERO),
    );
    pool.run();

    let log = log.borrow();
    assert_eq!(log.iter().filter(|v| **v < 100).copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    assert!(log.contains(&100));
  }

  #[test]
  fn cancelled_before_start() {
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();
    let ran = Rc::new(RefCell::new(false));
    let r = ran.clone();
    let handle = spawner.schedule(move || *r.borrow_mut() = true, Some(Duration::from_millis(1)));
    handle.unsubscribe();
    pool.run();
    assert!(!*ran.borrow());
  }
}
