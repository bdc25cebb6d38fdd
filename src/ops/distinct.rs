use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};
use std::{collections::HashSet, hash::Hash};

#[derive(Clone)]
pub struct DistinctOp<S> {
  pub(crate) source: S,
}

pub struct DistinctObserver<O, Item> {
  observer: O,
  seen: HashSet<Item>,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for DistinctOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, DistinctObserver<O, Item>>,
  Item: Hash + Eq + Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(DistinctObserver { observer, seen: HashSet::new() })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for DistinctOp<S> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O> Observer<Item, Err> for DistinctObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: Hash + Eq + Clone,
{
  fn next(&mut self, value: Item) {
    if !self.seen.contains(&value) {
      self.seen.insert(value.clone());
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

#[derive(Clone)]
pub struct DistinctUntilChangedOp<S> {
  pub(crate) source: S,
}

pub struct DistinctUntilChangedObserver<O, Item> {
  observer: O,
  last: Option<Item>,
}

impl<Item, Err, O, S> Observable<Item, Err, O> for DistinctUntilChangedOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, DistinctUntilChangedObserver<O, Item>>,
  Item: PartialEq + Clone,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(DistinctUntilChangedObserver { observer, last: None })
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for DistinctUntilChangedOp<S> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O> Observer<Item, Err> for DistinctUntilChangedObserver<O, Item>
where
  O: Observer<Item, Err>,
  Item: PartialEq + Clone,
{
  fn next(&mut self, value: Item) {
    if self.last.as_ref() != Some(&value) {
      self.last = Some(value.clone());
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
  fn distinct_drops_repeats() {
    let mut out = vec![];
    observable::from_iter([1, 2, 1, 3, 2, 4]).distinct().subscribe(|v| out.push(v));
    assert_eq!(out, vec![1, 2, 3, 4]);
  }

  #[test]
  fn distinct_until_changed_drops_consecutive_repeats() {
    let mut out = vec![];
    observable::from_iter([1, 1, 2, 2, 1, 3, 3])
      .distinct_until_changed()
      .subscribe(|v| out.push(v));
    assert_eq!(out, vec![1, 2, 1, 3]);
  }
}
