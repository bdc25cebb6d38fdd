use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  scheduler::{Duration, Scheduler},
  subscription::{LocalSubscription, Subscription, TupleSubscription},
};

/// Shifts every value and the completion later in time by `delay`, keeping
/// their order. Errors are forwarded at once and cancel everything still
/// waiting.
#[derive(Clone)]
pub struct DelayOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) delay: Duration,
  pub(crate) scheduler: Sch,
}

pub struct DelayObserver<O, Sch> {
  observer: MutRc<Option<O>>,
  timers: LocalSubscription,
  delay: Duration,
  scheduler: Sch,
}

impl<Item, Err, O, S, Sch> Observable<Item, Err, O> for DelayOp<S, Sch>
where
  O: Observer<Item, Err> + 'static,
  S: Observable<Item, Err, DelayObserver<O, Sch>>,
  Sch: Scheduler,
  Item: 'static,
{
  type Unsub = TupleSubscription<S::Unsub, LocalSubscription>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let timers = LocalSubscription::default();
    let observer = DelayObserver {
      observer: MutRc::own(Some(observer)),
      timers: timers.clone(),
      delay: self.delay,
      scheduler: self.scheduler,
    };
    TupleSubscription::new(self.source.actual_subscribe(observer), timers)
  }
}

impl<Item, Err, S, Sch> ObservableExt<Item, Err> for DelayOp<S, Sch> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O, Sch> Observer<Item, Err> for DelayObserver<O, Sch>
where
  O: Observer<Item, Err> + 'static,
  Sch: Scheduler,
  Item: 'static,
{
  fn next(&mut self, value: Item) {
    let mut observer = self.observer.clone();
    let handle = self.scheduler.schedule(move || observer.next(value), Some(self.delay));
    self.timers.add(handle);
  }

  fn error(self, err: Err) {
    self.timers.unsubscribe();
    self.observer.error(err)
  }

  fn complete(self) {
    let observer = self.observer;
    let handle = self.scheduler.schedule(move || Observer::<Item, Err>::complete(observer), Some(self.delay));
    self.timers.add(handle);
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn shifts_values_and_completion() {
    let scheduler = TestScheduler::new();
    let out = Rc::new(RefCell::new(vec![]));
    let done = Rc::new(RefCell::new(false));
    let (o, d) = (out.clone(), done.clone());
    observable::from_iter([1, 2, 3])
      .delay(Duration::from_millis(50), scheduler.clone())
      .subscribe_all(move |v| o.borrow_mut().push(v), |_| {}, move || *d.borrow_mut() = true);
    scheduler.advance_by(Duration::from_millis(49));
    assert!(out.borrow().is_empty());
    assert!(!*done.borrow());
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(*out.borrow(), vec![1, 2, 3]);
    assert!(*done.borrow());
  }

  #[test]
  fn error_is_not_delayed() {
    let scheduler = TestScheduler::new();
    let source = Subject::<i32, &'static str>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let err = Rc::new(RefCell::new(None));
    let (o, e) = (out.clone(), err.clone());
    source
      .clone()
      .delay(Duration::from_millis(10), scheduler.clone())
      .subscribe_all(move |v| o.borrow_mut().push(v), move |v| *e.borrow_mut() = Some(v), || {});
    source.next(1);
    source.error("boom");
    assert_eq!(*err.borrow(), Some("boom"));
    assert_eq!(scheduler.pending_count(), 0);
    scheduler.advance_by(Duration::from_millis(10));
    assert!(out.borrow().is_empty());
  }

  #[test]
  fn unsubscribe_cancels_pending_values() {
    let scheduler = TestScheduler::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    let subscription = observable::of(1)
      .delay(Duration::from_millis(10), scheduler.clone())
      .subscribe(move |v| o.borrow_mut().push(v));
    assert_eq!(scheduler.pending_count(), 2);
    subscription.unsubscribe();
    assert_eq!(scheduler.pending_count(), 0);
    scheduler.flush();
    assert!(out.borrow().is_empty());
  }
}
