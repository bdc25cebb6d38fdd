use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscription::{Subscription, SubscriptionSlot, TupleSubscription},
};

/// Emits every value of `first`, then subscribes `second` and emits its
/// values. An error from either side terminates the whole stream.
#[derive(Clone)]
pub struct ConcatOp<S1, S2> {
  pub(crate) first: S1,
  pub(crate) second: S2,
}

pub struct ConcatObserver<O, S2> {
  observer: O,
  second: S2,
  second_slot: SubscriptionSlot,
}

impl<Item, Err, O, S1, S2> Observable<Item, Err, O> for ConcatOp<S1, S2>
where
  O: Observer<Item, Err>,
  S1: Observable<Item, Err, ConcatObserver<O, S2>>,
  S1::Unsub: 'static,
  S2: Observable<Item, Err, O>,
  S2::Unsub: 'static,
{
  type Unsub = TupleSubscription<SubscriptionSlot, SubscriptionSlot>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let first_slot = SubscriptionSlot::default();
    let second_slot = SubscriptionSlot::default();
    let observer = ConcatObserver { observer, second: self.second, second_slot: second_slot.clone() };
    first_slot.replace(self.first.actual_subscribe(observer));
    TupleSubscription::new(first_slot, second_slot)
  }
}

impl<Item, Err, S1, S2> ObservableExt<Item, Err> for ConcatOp<S1, S2>
where
  S1: ObservableExt<Item, Err>,
  S2: ObservableExt<Item, Err>,
{
}

impl<Item, Err, O, S2> Observer<Item, Err> for ConcatObserver<O, S2>
where
  O: Observer<Item, Err>,
  S2: Observable<Item, Err, O>,
  S2::Unsub: 'static,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) {
    if self.second_slot.is_closed() || self.observer.is_closed() {
      return;
    }
    let unsub = self.second.actual_subscribe(self.observer);
    self.second_slot.replace(unsub);
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn sequential_order() {
    let mut out = vec![];
    let mut completed = 0;
    observable::from_iter(0..3)
      .concat(observable::from_iter(10..12))
      .subscribe_all(|v| out.push(v), |_| {}, || completed += 1);
    assert_eq!(out, vec![0, 1, 2, 10, 11]);
    assert_eq!(completed, 1);
  }

  #[test]
  fn second_waits_for_async_first() {
    let scheduler = TestScheduler::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    observable::timer(Duration::from_millis(10), scheduler.clone())
      .map(|_| 1)
      .concat(observable::of(2))
      .subscribe(move |v| o.borrow_mut().push(v));
    assert!(out.borrow().is_empty());
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*out.borrow(), vec![1, 2]);
  }

  #[test]
  fn unsubscribe_before_first_completes_skips_second() {
    let scheduler = TestScheduler::new();
    let subscribed = Rc::new(RefCell::new(false));
    let s = subscribed.clone();
    let unsub = observable::timer(Duration::from_millis(10), scheduler.clone())
      .map(|_| 1)
      .concat(observable::defer(move || {
        *s.borrow_mut() = true;
        observable::of(2)
      }))
      .subscribe(|_| {});
    unsub.unsubscribe();
    scheduler.advance_by(Duration::from_millis(20));
    assert!(!*subscribed.borrow());
  }
}
