use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscription::{Subscription, SubscriptionSlot},
  type_hint::TypeHint,
};

/// Map with a fallible function. An `Err` from the function is delivered as
/// the stream's error and the source is unsubscribed.
#[derive(Clone)]
pub struct TryMapOp<S, F, Item> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _hint: TypeHint<Item>,
}

pub struct TryMapObserver<O, F> {
  observer: Option<O>,
  func: F,
  upstream: SubscriptionSlot,
}

impl<Item, B, Err, O, S, F> Observable<B, Err, O> for TryMapOp<S, F, Item>
where
  S: Observable<Item, Err, TryMapObserver<O, F>>,
  S::Unsub: 'static,
  F: FnMut(Item) -> Result<B, Err>,
{
  type Unsub = SubscriptionSlot;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SubscriptionSlot::default();
    let observer = TryMapObserver { observer: Some(observer), func: self.func, upstream: upstream.clone() };
    upstream.replace(self.source.actual_subscribe(observer));
    upstream
  }
}

impl<Item, B, Err, S, F> ObservableExt<B, Err> for TryMapOp<S, F, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
}

impl<Item, B, Err, O, F> Observer<Item, Err> for TryMapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> Result<B, Err>,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match (self.func)(value) {
      Ok(v) => self.observer.next(v),
      Err(e) => {
        if let Some(o) = self.observer.take() {
          o.error(e);
        }
        self.upstream.clone().unsubscribe();
      }
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
  fn first_failure_terminates() {
    let seen = Rc::new(RefCell::new(vec![]));
    let (s1, s2, s3) = (seen.clone(), seen.clone(), seen.clone());
    observable::from_iter(["1", "2", "x", "4"])
      .map_err(|e: Infallible| -> String { match e {} })
      .try_map(|s: &str| s.parse::<i32>().map_err(|e| e.to_string()))
      .subscribe_all(
        move |v| s1.borrow_mut().push(format!("{v}")),
        move |e: String| s2.borrow_mut().push(format!("err:{}", e.is_empty())),
        move || s3.borrow_mut().push("done".into()),
      );
    assert_eq!(*seen.borrow(), vec!["1", "2", "err:false"]);
  }
}
