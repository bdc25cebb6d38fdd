use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

#[derive(Clone)]
pub struct MapOp<S, F, Item> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _hint: TypeHint<Item>,
}

pub struct MapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, B, Err, O, S, F> Observable<B, Err, O> for MapOp<S, F, Item>
where
  S: Observable<Item, Err, MapObserver<O, F>>,
  F: FnMut(Item) -> B,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(MapObserver { observer, func: self.func })
  }
}

impl<Item, B, Err, S, F> ObservableExt<B, Err> for MapOp<S, F, Item>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(Item) -> B,
{
}

impl<Item, B, Err, O, F> Observer<Item, Err> for MapObserver<O, F>
where
  O: Observer<B, Err>,
  F: FnMut(Item) -> B,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next((self.func)(value)) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[derive(Clone)]
pub struct MapToOp<S, B, Item> {
  pub(crate) source: S,
  pub(crate) value: B,
  pub(crate) _hint: TypeHint<Item>,
}

pub struct MapToObserver<O, B> {
  observer: O,
  value: B,
}

impl<Item, B, Err, O, S> Observable<B, Err, O> for MapToOp<S, B, Item>
where
  S: Observable<Item, Err, MapToObserver<O, B>>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(MapToObserver { observer, value: self.value })
  }
}

impl<Item, B, Err, S> ObservableExt<B, Err> for MapToOp<S, B, Item> where S: ObservableExt<Item, Err> {}

impl<Item, B, Err, O> Observer<Item, Err> for MapToObserver<O, B>
where
  O: Observer<B, Err>,
  B: Clone,
{
  #[inline]
  fn next(&mut self, _: Item) { self.observer.next(self.value.clone()) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
