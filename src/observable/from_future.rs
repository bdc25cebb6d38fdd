use crate::{
  error::RxError,
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  scheduler::TaskHandle,
};
use futures::{
  future::{abortable, FutureExt},
  task::{LocalSpawn, LocalSpawnExt},
};
use std::future::Future;
use tracing::warn;

/// Converts a `Future` into an observable that emits its output and
/// completes. The future is spawned on `spawner` when subscribed and aborted
/// when unsubscribed.
///
/// If the spawner refuses the task the observable errors with
/// [`RxError::Resource`].
pub fn from_future<F, Sp>(future: F, spawner: Sp) -> ObservableFuture<F, Sp>
where
  F: Future,
  Sp: LocalSpawn,
{
  ObservableFuture { future, spawner }
}

#[derive(Clone)]
pub struct ObservableFuture<F, Sp> {
  future: F,
  spawner: Sp,
}

impl<F, Sp, O> Observable<F::Output, RxError, O> for ObservableFuture<F, Sp>
where
  F: Future + 'static,
  Sp: LocalSpawn,
  O: Observer<F::Output, RxError> + 'static,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let observer = MutRc::own(Some(observer));
    let handle = TaskHandle::new();
    let (o, h) = (observer.clone(), handle.clone());
    let future = self.future;
    let (task, abort) = abortable(async move {
      let value = future.await;
      if h.begin() {
        let mut o = o;
        o.next(value);
        o.complete();
        h.finish();
      }
    });
    handle.set_abort(abort);
    if let Err(e) = self.spawner.spawn_local(task.map(|_| ())) {
      warn!(error = %e, "from_future could not spawn its task");
      handle.finish();
      observer.error(RxError::from(e));
    }
    handle
  }
}

impl<F: Future, Sp> ObservableExt<F::Output, RxError> for ObservableFuture<F, Sp> {}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use futures::{executor::LocalPool, future};
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn emits_future_output() {
    let mut pool = LocalPool::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let (s, c) = (seen.clone(), seen.clone());
    observable::from_future(future::ready(7), pool.spawner()).subscribe_all(
      move |v| s.borrow_mut().push(v),
      |_| {},
      move || c.borrow_mut().push(-1),
    );
    assert!(seen.borrow().is_empty());
    pool.run();
    assert_eq!(*seen.borrow(), vec![7, -1]);
  }

  #[test]
  fn unsubscribe_aborts() {
    let mut pool = LocalPool::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    let subscription = observable::from_future(future::ready(1), pool.spawner())
      .subscribe_all(move |v| s.borrow_mut().push(v), |_| {}, || {});
    subscription.unsubscribe();
    pool.run();
    assert!(seen.borrow().is_empty());
  }
}
