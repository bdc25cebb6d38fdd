use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  rc::MutRc,
  subscription::{LocalSubscription, Subscription, SubscriptionSlot},
};

/// Emits every value, then feeds it to `func` and merges the returned
/// stream back in, recursively. Completes once the source and every
/// expanded stream completed.
///
/// Expanded streams are subscribed through a [`BoxedObserver`], which keeps
/// the observer type from mentioning itself.
#[derive(Clone)]
pub struct ExpandOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

#[doc(hidden)]
pub struct ExpandObserver<O, F> {
  observer: MutRc<Option<O>>,
  func: MutRc<F>,
  active: MutRc<usize>,
  subscription: LocalSubscription,
  slot: SubscriptionSlot,
}

impl<O, F> ExpandObserver<O, F> {
  fn branch(&self, slot: SubscriptionSlot) -> Self {
    *self.active.rc_deref_mut() += 1;
    ExpandObserver {
      observer: self.observer.clone(),
      func: self.func.clone(),
      active: self.active.clone(),
      subscription: self.subscription.clone(),
      slot,
    }
  }
}

impl<Item, Err, O, S, F, Inner> Observable<Item, Err, O> for ExpandOp<S, F>
where
  O: Observer<Item, Err> + 'static,
  S: Observable<Item, Err, ExpandObserver<O, F>>,
  S::Unsub: 'static,
  F: FnMut(&Item) -> Inner + 'static,
  Inner: Observable<Item, Err, BoxedObserver<Item, Err>>,
  Inner::Unsub: 'static,
  Item: Clone + 'static,
  Err: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let subscription = LocalSubscription::default();
    let slot = SubscriptionSlot::default();
    subscription.add(slot.clone());
    let root = ExpandObserver {
      observer: MutRc::own(Some(observer)),
      func: MutRc::own(self.func),
      active: MutRc::own(1),
      subscription: subscription.clone(),
      slot: slot.clone(),
    };
    slot.replace(self.source.actual_subscribe(root));
    subscription
  }
}

impl<Item, Err, S, F, Inner> ObservableExt<Item, Err> for ExpandOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item) -> Inner,
{
}

impl<Item, Err, O, F, Inner> Observer<Item, Err> for ExpandObserver<O, F>
where
  O: Observer<Item, Err> + 'static,
  F: FnMut(&Item) -> Inner + 'static,
  Inner: Observable<Item, Err, BoxedObserver<Item, Err>>,
  Inner::Unsub: 'static,
  Item: Clone + 'static,
  Err: 'static,
{
  fn next(&mut self, value: Item) {
    self.observer.next(value.clone());
    if Observer::<Item, Err>::is_closed(&self.observer) {
      return;
    }
    let inner = (self.func.rc_deref_mut())(&value);
    let slot = SubscriptionSlot::default();
    self.subscription.add(slot.clone());
    let branch: BoxedObserver<Item, Err> = Box::new(self.branch(slot.clone()));
    slot.replace(inner.actual_subscribe(branch));
  }

  fn error(self, err: Err) {
    self.observer.error(err);
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    self.slot.unsubscribe();
    let remaining = {
      let mut active = self.active.rc_deref_mut();
      *active -= 1;
      *active
    };
    if remaining == 0 {
      Observer::<Item, Err>::complete(self.observer);
      self.subscription.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.observer) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn walks_pages_until_exhausted() {
    let pages = Rc::new(RefCell::new(vec![]));
    let completed = Rc::new(RefCell::new(false));
    let (p, c) = (pages.clone(), completed.clone());
    observable::of(1)
      .expand(|page: &u32| observable::from_iter(if *page < 4 { vec![page + 1] } else { vec![] }))
      .subscribe_all(move |v| p.borrow_mut().push(v), |_| {}, move || *c.borrow_mut() = true);
    assert_eq!(*pages.borrow(), vec![1, 2, 3, 4]);
    assert!(*completed.borrow());
  }

  #[test]
  fn branches_are_merged() {
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    observable::of(1)
      .expand(|v: &i32| observable::from_iter(if *v < 4 { vec![v * 2, v * 2 + 1] } else { vec![] }))
      .subscribe(move |v| o.borrow_mut().push(v));
    out.borrow_mut().sort_unstable();
    assert_eq!(*out.borrow(), vec![1, 2, 3, 4, 5, 6, 7]);
  }

  #[test]
  fn value_is_emitted_before_it_is_projected() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    observable::of(1)
      .expand(move |v: &i32| {
        l1.borrow_mut().push(format!("project {v}"));
        observable::from_iter(if *v < 2 { vec![v + 1] } else { vec![] })
      })
      .subscribe(move |v| l2.borrow_mut().push(format!("emit {v}")));
    assert_eq!(*log.borrow(), vec!["emit 1", "project 1", "emit 2", "project 2"]);
  }

  #[test]
  fn unbounded_recursion_stops_with_take() {
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    observable::of(0)
      .expand(|v: &i32| observable::of(v + 1))
      .take(5)
      .subscribe(move |v| o.borrow_mut().push(v));
    assert_eq!(*out.borrow(), vec![0, 1, 2, 3, 4]);
  }
}
