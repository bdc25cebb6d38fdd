use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// Folds the whole source into one value, emitted when the source
/// completes. An empty source emits the seed.
#[derive(Clone)]
pub struct ReduceOp<S, F, B, Item> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) seed: B,
  pub(crate) _hint: TypeHint<Item>,
}

pub type CountOp<S, Item> = ReduceOp<S, fn(usize, Item) -> usize, usize, Item>;

pub type ToVecOp<S, Item> = ReduceOp<S, fn(Vec<Item>, Item) -> Vec<Item>, Vec<Item>, Item>;

pub struct ReduceObserver<O, F, B> {
  observer: O,
  func: F,
  acc: Option<B>,
}

impl<Item, Err, O, S, F, B> Observable<B, Err, O> for ReduceOp<S, F, B, Item>
where
  O: Observer<B, Err>,
  S: Observable<Item, Err, ReduceObserver<O, F, B>>,
  F: FnMut(B, Item) -> B,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(ReduceObserver { observer, func: self.func, acc: Some(self.seed) })
  }
}

impl<Item, Err, S, F, B> ObservableExt<B, Err> for ReduceOp<S, F, B, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(B, Item) -> B,
{
}

impl<Item, Err, O, F, B> Observer<Item, Err> for ReduceObserver<O, F, B>
where
  O: Observer<B, Err>,
  F: FnMut(B, Item) -> B,
{
  fn next(&mut self, value: Item) {
    if let Some(acc) = self.acc.take() {
      self.acc = Some((self.func)(acc, value));
    }
  }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(mut self) {
    if let Some(acc) = self.acc {
      self.observer.next(acc);
    }
    self.observer.complete();
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn folds_on_complete() {
    let mut out = vec![];
    observable::from_iter(1..=4).reduce(0, |acc, v| acc + v).subscribe(|v| out.push(v));
    assert_eq!(out, vec![10]);
  }

  #[test]
  fn empty_source_emits_seed() {
    let mut out = vec![];
    observable::empty().reduce(7, |acc: i32, v: i32| acc * v).subscribe(|v| out.push(v));
    assert_eq!(out, vec![7]);
  }

  #[test]
  fn count_and_to_vec() {
    let mut count = 0;
    observable::from_iter(0..5).count().subscribe(|v| count = v);
    assert_eq!(count, 5);

    let mut all = vec![];
    observable::from_iter("abc".chars()).to_vec().subscribe(|v| all = v);
    assert_eq!(all, vec!['a', 'b', 'c']);
  }

  #[test]
  fn error_emits_no_value() {
    let mut out = vec![];
    let mut failed = false;
    observable::throw_err::<i32, _>(())
      .count()
      .subscribe_all(|v| out.push(v), |_| failed = true, || {});
    assert!(out.is_empty());
    assert!(failed);
  }
}
