use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscription::{Subscription, SubscriptionSlot},
};

/// Emits values while `predicate` holds, then completes and unsubscribes
/// the source. With `inclusive` the failing value is emitted too.
#[derive(Clone)]
pub struct TakeWhileOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
  pub(crate) inclusive: bool,
}

pub struct TakeWhileObserver<O, F> {
  observer: Option<O>,
  predicate: F,
  inclusive: bool,
  upstream: SubscriptionSlot,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for TakeWhileOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TakeWhileObserver<O, F>>,
  S::Unsub: 'static,
  F: FnMut(&Item) -> bool,
{
  type Unsub = SubscriptionSlot;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SubscriptionSlot::default();
    let observer = TakeWhileObserver {
      observer: Some(observer),
      predicate: self.predicate,
      inclusive: self.inclusive,
      upstream: upstream.clone(),
    };
    upstream.replace(self.source.actual_subscribe(observer));
    upstream
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for TakeWhileOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item) -> bool,
{
}

impl<Item, Err, O, F> Observer<Item, Err> for TakeWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    let Some(observer) = self.observer.as_mut() else {
      return;
    };
    if (self.predicate)(&value) {
      observer.next(value);
      return;
    }
    if self.inclusive {
      observer.next(value);
    }
    if let Some(observer) = self.observer.take() {
      observer.complete();
    }
    self.upstream.clone().unsubscribe();
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
