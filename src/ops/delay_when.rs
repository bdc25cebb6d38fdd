use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{LocalSubscription, Subscription, SubscriptionSlot},
  type_hint::TypeHint,
};

/// Holds each value until the duration stream built for it by `func` emits
/// or completes, then emits the value and drops that duration stream.
///
/// Values are released in trigger order, not arrival order. The output
/// completes once the source completed and every held value was released.
#[derive(Clone)]
pub struct DelayWhenOp<S, F, DItem> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _hint: TypeHint<DItem>,
}

struct Pending {
  held: usize,
  source_done: bool,
}

pub struct DelayWhenShared<O> {
  observer: MutRc<Option<O>>,
  pending: MutRc<Pending>,
  subscription: LocalSubscription,
}

impl<O> Clone for DelayWhenShared<O> {
  fn clone(&self) -> Self {
    DelayWhenShared {
      observer: self.observer.clone(),
      pending: self.pending.clone(),
      subscription: self.subscription.clone(),
    }
  }
}

impl<O> DelayWhenShared<O> {
  fn complete_if_drained<Item, Err>(self)
  where
    O: Observer<Item, Err>,
  {
    let drained = {
      let pending = self.pending.rc_deref();
      pending.source_done && pending.held == 0
    };
    if drained {
      Observer::<Item, Err>::complete(self.observer);
      self.subscription.unsubscribe();
    }
  }

  fn fail<Item, Err>(self, err: Err)
  where
    O: Observer<Item, Err>,
  {
    self.observer.error(err);
    self.subscription.unsubscribe();
  }
}

pub struct DelayWhenObserver<O, F, DItem> {
  shared: DelayWhenShared<O>,
  func: F,
  _hint: TypeHint<DItem>,
}

/// Observer of one duration stream, holding the value it releases.
pub struct DelayWhenTrigger<O, Item> {
  shared: DelayWhenShared<O>,
  value: Option<Item>,
  slot: SubscriptionSlot,
}

impl<O, Item> DelayWhenTrigger<O, Item> {
  fn release<Err>(&mut self)
  where
    O: Observer<Item, Err>,
  {
    let Some(value) = self.value.take() else {
      return;
    };
    self.slot.clone().unsubscribe();
    self.shared.pending.rc_deref_mut().held -= 1;
    self.shared.observer.next(value);
    self.shared.clone().complete_if_drained::<Item, Err>();
  }
}

impl<Item, DItem, Err, O, S, F, D> Observable<Item, Err, O> for DelayWhenOp<S, F, DItem>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, DelayWhenObserver<O, F, DItem>>,
  S::Unsub: 'static,
  F: FnMut(&Item) -> D,
  D: Observable<DItem, Err, DelayWhenTrigger<O, Item>>,
  D::Unsub: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let shared = DelayWhenShared {
      observer: MutRc::own(Some(observer)),
      pending: MutRc::own(Pending { held: 0, source_done: false }),
      subscription: LocalSubscription::default(),
    };
    let subscription = shared.subscription.clone();
    let slot = SubscriptionSlot::default();
    subscription.add(slot.clone());
    slot.replace(self.source.actual_subscribe(DelayWhenObserver { shared, func: self.func, _hint: TypeHint::new() }));
    subscription
  }
}

impl<Item, DItem, Err, S, F, D> ObservableExt<Item, Err> for DelayWhenOp<S, F, DItem>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item) -> D,
  D: ObservableExt<DItem, Err>,
{
}

impl<Item, DItem, Err, O, F, D> Observer<Item, Err> for DelayWhenObserver<O, F, DItem>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> D,
  D: Observable<DItem, Err, DelayWhenTrigger<O, Item>>,
  D::Unsub: 'static,
{
  fn next(&mut self, value: Item) {
    let duration = (self.func)(&value);
    self.shared.pending.rc_deref_mut().held += 1;
    let slot = SubscriptionSlot::default();
    self.shared.subscription.add(slot.clone());
    let trigger = DelayWhenTrigger { shared: self.shared.clone(), value: Some(value), slot: slot.clone() };
    slot.replace(duration.actual_subscribe(trigger));
  }

  fn error(self, err: Err) { self.shared.fail(err) }

  fn complete(self) {
    self.shared.pending.rc_deref_mut().source_done = true;
    self.shared.complete_if_drained::<Item, Err>();
  }

  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.shared.observer) }
}

impl<Item, DItem, Err, O> Observer<DItem, Err> for DelayWhenTrigger<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _: DItem) { self.release::<Err>() }

  fn error(self, err: Err) { self.shared.fail(err) }

  fn complete(mut self) { self.release::<Err>() }

  fn is_closed(&self) -> bool { self.value.is_none() || Observer::<Item, Err>::is_closed(&self.shared.observer) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn each_value_waits_for_its_own_trigger() {
    let scheduler = TestScheduler::new();
    let out = Rc::new(RefCell::new(vec![]));
    let done = Rc::new(RefCell::new(false));
    let (o, d) = (out.clone(), done.clone());
    let s = scheduler.clone();
    observable::from_iter([30u64, 10, 20])
      .delay_when(move |ms| observable::timer(Duration::from_millis(*ms), s.clone()))
      .subscribe_all(move |v| o.borrow_mut().push(v), |_| {}, move || *d.borrow_mut() = true);
    scheduler.advance_by(Duration::from_millis(20));
    assert_eq!(*out.borrow(), vec![10, 20]);
    assert!(!*done.borrow());
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*out.borrow(), vec![10, 20, 30]);
    assert!(*done.borrow());
  }

  #[test]
  fn empty_trigger_releases_immediately() {
    let mut out = vec![];
    observable::from_iter([1, 2]).delay_when(|_| observable::empty::<()>()).subscribe(|v| out.push(v));
    assert_eq!(out, vec![1, 2]);
  }
}
