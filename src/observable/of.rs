use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};
use std::convert::Infallible;

/// Creates an observable producing a single value, then completing.
///
/// ```rust
/// use rxcore::prelude::*;
///
/// observable::of(123).subscribe(|v| println!("{v}"));
/// ```
pub fn of<Item>(v: Item) -> ObservableOf<Item> { ObservableOf(v) }

/// Creates an observable that completes immediately without values.
pub fn empty<Item>() -> ObservableEmpty<Item> { ObservableEmpty(TypeHint::new()) }

/// Creates an observable that never emits and never terminates.
pub fn never<Item>() -> ObservableNever<Item> { ObservableNever(TypeHint::new()) }

/// Creates an observable that errors immediately with `err`.
pub fn throw_err<Item, Err>(err: Err) -> ObservableThrow<Item, Err> {
  ObservableThrow(err, TypeHint::new())
}

#[derive(Clone)]
pub struct ObservableOf<Item>(pub(crate) Item);

impl<Item, Err, O> Observable<Item, Err, O> for ObservableOf<Item>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    observer.next(self.0);
    observer.complete();
  }
}

impl<Item> ObservableExt<Item, Infallible> for ObservableOf<Item> {}

#[derive(Clone)]
pub struct ObservableEmpty<Item>(TypeHint<Item>);

impl<Item, Err, O> Observable<Item, Err, O> for ObservableEmpty<Item>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.complete() }
}

impl<Item> ObservableExt<Item, Infallible> for ObservableEmpty<Item> {}

#[derive(Clone)]
pub struct ObservableNever<Item>(TypeHint<Item>);

impl<Item, Err, O> Observable<Item, Err, O> for ObservableNever<Item> {
  type Unsub = ();

  fn actual_subscribe(self, _: O) -> Self::Unsub {}
}

impl<Item> ObservableExt<Item, Infallible> for ObservableNever<Item> {}

#[derive(Clone)]
pub struct ObservableThrow<Item, Err>(Err, TypeHint<Item>);

impl<Item, Err, O> Observable<Item, Err, O> for ObservableThrow<Item, Err>
where
  O: Observer<Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, observer: O) -> Self::Unsub { observer.error(self.0) }
}

impl<Item, Err> ObservableExt<Item, Err> for ObservableThrow<Item, Err> {}
