//! Extract one field out of map-like values.

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  subscription::{Subscription, SubscriptionSlot},
  type_hint::TypeHint,
};
use std::{
  collections::{BTreeMap, HashMap},
  hash::{BuildHasher, Hash},
};

/// Values `pluck` can look a key up in.
pub trait Field<K> {
  type Value;

  fn field(&self, key: &K) -> Option<Self::Value>;
}

impl<K, V, H> Field<K> for HashMap<K, V, H>
where
  K: Hash + Eq,
  V: Clone,
  H: BuildHasher,
{
  type Value = V;

  fn field(&self, key: &K) -> Option<V> { self.get(key).cloned() }
}

impl<K: Ord, V: Clone> Field<K> for BTreeMap<K, V> {
  type Value = V;

  fn field(&self, key: &K) -> Option<V> { self.get(key).cloned() }
}

#[derive(Clone)]
pub struct PluckOp<S, K, Item> {
  pub(crate) source: S,
  pub(crate) key: K,
  pub(crate) _hint: TypeHint<Item>,
}

pub struct PluckObserver<O, K> {
  observer: O,
  key: K,
}

impl<Item, Err, O, S, K> Observable<Option<Item::Value>, Err, O> for PluckOp<S, K, Item>
where
  Item: Field<K>,
  S: Observable<Item, Err, PluckObserver<O, K>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(PluckObserver { observer, key: self.key })
  }
}

impl<Item, Err, S, K> ObservableExt<Option<Item::Value>, Err> for PluckOp<S, K, Item>
where
  Item: Field<K>,
  S: ObservableExt<Item, Err>,
{
}

impl<Item, Err, O, K> Observer<Item, Err> for PluckObserver<O, K>
where
  Item: Field<K>,
  O: Observer<Option<Item::Value>, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value.field(&self.key)) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// `pluck` that fails the stream on a missing key.
#[derive(Clone)]
pub struct PluckStrictOp<S, K, F, Item> {
  pub(crate) source: S,
  pub(crate) key: K,
  pub(crate) on_missing: F,
  pub(crate) _hint: TypeHint<Item>,
}

pub struct PluckStrictObserver<O, K, F> {
  observer: Option<O>,
  key: K,
  on_missing: F,
  upstream: SubscriptionSlot,
}

impl<Item, Err, O, S, K, F> Observable<Item::Value, Err, O> for PluckStrictOp<S, K, F, Item>
where
  Item: Field<K>,
  S: Observable<Item, Err, PluckStrictObserver<O, K, F>>,
  S::Unsub: 'static,
  F: FnMut(&K) -> Err,
{
  type Unsub = SubscriptionSlot;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let upstream = SubscriptionSlot::default();
    let observer = PluckStrictObserver {
      observer: Some(observer),
      key: self.key,
      on_missing: self.on_missing,
      upstream: upstream.clone(),
    };
    upstream.replace(self.source.actual_subscribe(observer));
    upstream
  }
}

impl<Item, Err, S, K, F> ObservableExt<Item::Value, Err> for PluckStrictOp<S, K, F, Item>
where
  Item: Field<K>,
  S: ObservableExt<Item, Err>,
  F: FnMut(&K) -> Err,
{
}

impl<Item, Err, O, K, F> Observer<Item, Err> for PluckStrictObserver<O, K, F>
where
  Item: Field<K>,
  O: Observer<Item::Value, Err>,
  F: FnMut(&K) -> Err,
{
  fn next(&mut self, value: Item) {
    if self.observer.is_none() {
      return;
    }
    match value.field(&self.key) {
      Some(v) => self.observer.next(v),
      None => {
        let err = (self.on_missing)(&self.key);
        if let Some(o) = self.observer.take() {
          o.error(err);
        }
        self.upstream.clone().unsubscribe();
      }
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
