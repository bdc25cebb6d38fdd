use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscription::{Subscription, SubscriptionSlot},
};

/// Emits the first value of the source, or `default` if the source
/// completes without one.
#[derive(Clone)]
pub struct FirstOrOp<S, Item> {
  pub(crate) source: S,
  pub(crate) default: Item,
}

pub struct FirstOrObserver<O, Item> {
  observer: Option<O>,
  default: Item,
  upstream: SubscriptionSlot,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for FirstOrOp<S, Item>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, FirstOrObserver<O, Item>>,
  S::Unsub: 'static,
{
  type Unsub = SubscriptionSlot;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SubscriptionSlot::default();
    let observer = FirstOrObserver { observer: Some(observer), default: self.default, upstream: upstream.clone() };
    upstream.replace(self.source.actual_subscribe(observer));
    upstream
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for FirstOrOp<S, Item> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O> Observer<Item, Err> for FirstOrObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(mut observer) = self.observer.take() {
      observer.next(value);
      observer.complete();
      self.upstream.clone().unsubscribe();
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) {
    if let Some(mut observer) = self.observer {
      observer.next(self.default);
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn first_value_wins() {
    let mut out = vec![];
    observable::from_iter(3..).first_or(100).subscribe(|v| out.push(v));
    assert_eq!(out, vec![3]);
  }

  #[test]
  fn default_on_empty() {
    let mut out = vec![];
    let mut completed = false;
    observable::empty().first_or(100).subscribe_all(|v| out.push(v), |_| {}, || completed = true);
    assert_eq!(out, vec![100]);
    assert!(completed);
  }
}
