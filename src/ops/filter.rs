use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

#[derive(Clone)]
pub struct FilterOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

pub struct FilterObserver<O, F> {
  observer: O,
  predicate: F,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for FilterOp<S, F>
where
  S: Observable<Item, Err, FilterObserver<O, F>>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(FilterObserver { observer, predicate: self.predicate })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for FilterOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item) -> bool,
{
}

impl<Item, Err, O, F> Observer<Item, Err> for FilterObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if (self.predicate)(&value) {
      self.observer.next(value)
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn keeps_matching_values() {
    let mut out = vec![];
    observable::from_iter(0..10).filter(|v| v % 3 == 0).subscribe(|v| out.push(v));
    assert_eq!(out, vec![0, 3, 6, 9]);
  }

  #[test]
  fn forwards_error() {
    let mut failed = false;
    observable::throw_err::<i32, _>("boom").filter(|_| true).subscribe_all(
      |_| {},
      |_| failed = true,
      || {},
    );
    assert!(failed);
  }
}
