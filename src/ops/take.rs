use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscription::{Subscription, SubscriptionSlot},
};

/// Emits only the first `count` values emitted by the source Observable.
///
/// `take` returns an Observable that emits only the first `count` values
/// emitted by the source Observable. If the source emits fewer than `count`
/// values then all of its values are emitted. After that, it completes,
/// regardless if the source completes, and the source is unsubscribed.
///
/// # Example
/// Take the first 5 values of an unbounded source.
///
/// ```
/// use rxcore::prelude::*;
///
/// let mut out = vec![];
/// observable::from_iter(0..).take(5).subscribe(|v| out.push(v));
/// assert_eq!(out, vec![0, 1, 2, 3, 4]);
/// ```
#[derive(Clone)]
pub struct TakeOp<S> {
  pub(crate) source: S,
  pub(crate) count: usize,
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: SubscriptionSlot,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for TakeOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TakeObserver<O>>,
  S::Unsub: 'static,
{
  type Unsub = SubscriptionSlot;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SubscriptionSlot::default();
    if self.count == 0 {
      observer.complete();
      upstream.clone().unsubscribe();
      return upstream;
    }
    let observer = TakeObserver { observer: Some(observer), remaining: self.count, upstream: upstream.clone() };
    upstream.replace(self.source.actual_subscribe(observer));
    upstream
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for TakeOp<S> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else {
      return;
    };
    self.remaining -= 1;
    observer.next(value);
    if self.remaining == 0 {
      if let Some(observer) = self.observer.take() {
        observer.complete();
      }
      self.upstream.clone().unsubscribe();
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn base_function() {
    let mut completed = false;
    let mut next_count = 0;
    observable::from_iter(0..100).take(5).subscribe_all(|_| next_count += 1, |_| {}, || completed = true);
    assert_eq!(next_count, 5);
    assert!(completed);
  }

  #[test]
  fn fewer_values_than_count() {
    let mut out = vec![];
    observable::from_iter(0..2).take(5).subscribe(|v| out.push(v));
    assert_eq!(out, vec![0, 1]);
  }

  #[test]
  fn take_zero_never_subscribes() {
    let subscribed = Rc::new(RefCell::new(false));
    let s = subscribed.clone();
    let mut completed = false;
    observable::defer(move || {
      *s.borrow_mut() = true;
      observable::of(1)
    })
    .take(0)
    .subscribe_all(|_| {}, |_| {}, || completed = true);
    assert!(completed);
    assert!(!*subscribed.borrow());
  }

  #[test]
  fn unsubscribes_async_source_after_count() {
    let scheduler = TestScheduler::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    let unsub = observable::interval(Duration::from_millis(10), scheduler.clone())
      .take(3)
      .subscribe(move |v| o.borrow_mut().push(v));
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*out.borrow(), vec![0, 1, 2]);
    assert!(unsub.is_closed());
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn first_takes_one() {
    let mut out = vec![];
    observable::from_iter(5..).first().subscribe(|v| out.push(v));
    assert_eq!(out, vec![5]);

    let mut completed = false;
    let mut values = 0;
    observable::empty::<i32>().first().subscribe_all(|_| values += 1, |_| {}, || completed = true);
    assert!(completed);
    assert_eq!(values, 0);
  }
}
