use super::{Duration, Scheduler, TaskHandle};
use futures::future::{abortable, FutureExt};
use std::future::Future;
use tokio::time::Instant;
use tracing::trace;

/// Scheduler backed by the current tokio `LocalSet`.
///
/// Tasks are spawned with `tokio::task::spawn_local`, so subscriptions that
/// use it must live inside a `LocalSet`.
#[derive(Clone, Copy, Debug)]
pub struct TokioScheduler {
  origin: Instant,
}

impl TokioScheduler {
  pub fn new() -> Self { TokioScheduler { origin: Instant::now() } }

  fn spawn<Fut>(handle: &TaskHandle, fut: Fut)
  where
    Fut: Future<Output = ()> + 'static,
  {
    let (fut, abort) = abortable(fut);
    handle.set_abort(abort);
    tokio::task::spawn_local(fut.map(|_| ()));
  }
}

impl Default for TokioScheduler {
  fn default() -> Self { Self::new() }
}

impl Scheduler for TokioScheduler {
  fn now(&self) -> Duration { self.origin.elapsed() }

  fn schedule<F>(&self, task: F, delay: Option<Duration>) -> TaskHandle
  where
    F: FnOnce() + 'static,
  {
    trace!(?delay, "scheduling task on tokio");
    let handle = TaskHandle::new();
    let h = handle.clone();
    Self::spawn(&handle, async move {
      if let Some(d) = delay {
        tokio::time::sleep(d).await;
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
    let handle = TaskHandle::new();
    let h = handle.clone();
    Self::spawn(&handle, async move {
      tokio::time::sleep(delay.unwrap_or(period)).await;
      let mut tick = 0;
      while h.begin() {
        if !task(tick) {
          break;
        }
        h.suspend();
        tick += 1;
        tokio::time::sleep(period).await;
      }
      h.finish();
    });
    handle
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{cell::RefCell, rc::Rc};

  #[tokio::test]
  async fn runs_inside_local_set() {
    let local = tokio::task::LocalSet::new();
    let log = Rc::new(RefCell::new(vec![]));
    let l = log.clone();
    local
      .run_until(async move {
        let scheduler = TokioScheduler::new();
        scheduler.schedule(move || l.borrow_mut().push(1), Some(Duration::from_millis(1)));
        tokio::time::sleep(Duration::from_millis(20)).await;
      })
      .await;
    assert_eq!(*log.borrow(), vec![1]);
  }
}
