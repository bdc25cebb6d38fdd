use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

/// Applies an accumulator over the source and emits each intermediate
/// result, starting from `seed`.
#[derive(Clone)]
pub struct ScanOp<S, F, B, Item> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) seed: B,
  pub(crate) _hint: TypeHint<Item>,
}

pub struct ScanObserver<O, F, B> {
  observer: O,
  func: F,
  acc: Option<B>,
}

impl<Item, Err, O, S, F, B> Observable<B, Err, O> for ScanOp<S, F, B, Item>
where
  O: Observer<B, Err>,
  S: Observable<Item, Err, ScanObserver<O, F, B>>,
  F: FnMut(B, Item) -> B,
  B: Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(ScanObserver { observer, func: self.func, acc: Some(self.seed) })
  }
}

impl<Item, Err, S, F, B> ObservableExt<B, Err> for ScanOp<S, F, B, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(B, Item) -> B,
{
}

impl<Item, Err, O, F, B> Observer<Item, Err> for ScanObserver<O, F, B>
where
  O: Observer<B, Err>,
  F: FnMut(B, Item) -> B,
  B: Clone,
{
  fn next(&mut self, value: Item) {
    if let Some(acc) = self.acc.take() {
      let acc = (self.func)(acc, value);
      self.acc = Some(acc.clone());
      self.observer.next(acc);
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
  fn running_sum() {
    let mut out = vec![];
    observable::from_iter(1..=4).scan(0, |acc, v| acc + v).subscribe(|v| out.push(v));
    assert_eq!(out, vec![1, 3, 6, 10]);
  }

  #[test]
  fn empty_source_emits_nothing() {
    let mut out = vec![];
    let mut completed = false;
    observable::empty::<i32>()
      .scan(100, |acc, v| acc + v)
      .subscribe_all(|v| out.push(v), |_| {}, || completed = true);
    assert!(out.is_empty());
    assert!(completed);
  }

  #[test]
  fn each_subscription_restarts_from_seed() {
    let op = observable::from_iter(0..3).scan(String::new(), |mut acc, v| {
      acc.push_str(&v.to_string());
      acc
    });
    let mut a = vec![];
    let mut b = vec![];
    op.clone().subscribe(|v| a.push(v));
    op.subscribe(|v| b.push(v));
    assert_eq!(a, vec!["0", "01", "012"]);
    assert_eq!(a, b);
  }
}
