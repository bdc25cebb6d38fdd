use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};

/// Skip values while `predicate` holds; everything from the first failing
/// value on passes through.
#[derive(Clone)]
pub struct SkipWhileOp<S, F> {
  pub(crate) source: S,
  pub(crate) predicate: F,
}

pub struct SkipWhileObserver<O, F> {
  observer: O,
  predicate: F,
  done_skipping: bool,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for SkipWhileOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, SkipWhileObserver<O, F>>,
  F: FnMut(&Item) -> bool,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self
      .source
      .actual_subscribe(SkipWhileObserver { observer, predicate: self.predicate, done_skipping: false })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for SkipWhileOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item) -> bool,
{
}

impl<Item, Err, O, F> Observer<Item, Err> for SkipWhileObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item) -> bool,
{
  fn next(&mut self, value: Item) {
    if self.done_skipping {
      self.observer.next(value);
    } else if !(self.predicate)(&value) {
      self.done_skipping = true;
      self.observer.next(value);
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
  fn skips_leading_values_only() {
    let mut out = vec![];
    observable::from_iter([1, 2, 5, 1, 7]).skip_while(|v| *v < 3).subscribe(|v| out.push(v));
    assert_eq!(out, vec![5, 1, 7]);
  }
}
