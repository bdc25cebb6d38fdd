use crate::rc::MutRc;
use std::convert::Infallible;

/// An Observer is a consumer of values delivered by an Observable. One method
/// for each type of notification that the Observable may deliver: `next`,
/// `error`, and `complete`.
///
/// `error` and `complete` take `self` by value, so an observer can receive at
/// most one terminal notification.
pub trait Observer<Item, Err> {
  fn next(&mut self, value: Item);

  fn error(self, err: Err);

  fn complete(self);

  /// Once closed, sources stop producing for this observer.
  fn is_closed(&self) -> bool;
}

/// Object-safe form of [`Observer`].
pub trait DynObserver<Item, Err> {
  fn dyn_next(&mut self, value: Item);
  fn dyn_error(self: Box<Self>, err: Err);
  fn dyn_complete(self: Box<Self>);
  fn dyn_is_closed(&self) -> bool;
}

pub type BoxedObserver<Item, Err> = Box<dyn DynObserver<Item, Err>>;

impl<Item, Err, T> DynObserver<Item, Err> for T
where
  T: Observer<Item, Err>,
{
  #[inline]
  fn dyn_next(&mut self, value: Item) { self.next(value) }

  #[inline]
  fn dyn_error(self: Box<Self>, err: Err) { (*self).error(err) }

  #[inline]
  fn dyn_complete(self: Box<Self>) { (*self).complete() }

  #[inline]
  fn dyn_is_closed(&self) -> bool { self.is_closed() }
}

impl<Item, Err> Observer<Item, Err> for BoxedObserver<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { (**self).dyn_next(value) }

  #[inline]
  fn error(self, err: Err) { DynObserver::dyn_error(self, err) }

  #[inline]
  fn complete(self) { DynObserver::dyn_complete(self) }

  #[inline]
  fn is_closed(&self) -> bool { (**self).dyn_is_closed() }
}

impl<Item, Err, O> Observer<Item, Err> for Option<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(o) = self.as_mut() {
      o.next(value)
    }
  }

  fn error(self, err: Err) {
    if let Some(o) = self {
      o.error(err)
    }
  }

  fn complete(self) {
    if let Some(o) = self {
      o.complete()
    }
  }

  fn is_closed(&self) -> bool { self.as_ref().map_or(true, |o| o.is_closed()) }
}

/// A downstream observer shared between several upstream observers.
///
/// `next` borrows the cell for the duration of the delivery; terminal
/// notifications take the observer out first, so later notifications through
/// other clones become no-ops.
impl<Item, Err, O> Observer<Item, Err> for MutRc<Option<O>>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if let Some(o) = self.rc_deref_mut().as_mut() {
      o.next(value)
    }
  }

  fn error(self, err: Err) {
    let o = self.rc_deref_mut().take();
    if let Some(o) = o {
      o.error(err)
    }
  }

  fn complete(self) {
    let o = self.rc_deref_mut().take();
    if let Some(o) = o {
      o.complete()
    }
  }

  fn is_closed(&self) -> bool { self.rc_deref().as_ref().map_or(true, |o| o.is_closed()) }
}

/// Observer built from a `next` closure, for streams that cannot fail.
#[derive(Clone)]
pub struct FnMutObserver<N>(pub N);

impl<Item, N> Observer<Item, Infallible> for FnMutObserver<N>
where
  N: FnMut(Item),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.0)(value) }

  fn error(self, err: Infallible) { match err {} }

  #[inline]
  fn complete(self) {}

  #[inline]
  fn is_closed(&self) -> bool { false }
}

/// Observer built from three closures.
#[derive(Clone)]
pub struct AllObserver<N, E, C> {
  pub next: N,
  pub error: E,
  pub complete: C,
}

impl<Item, Err, N, E, C> Observer<Item, Err> for AllObserver<N, E, C>
where
  N: FnMut(Item),
  E: FnOnce(Err),
  C: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { (self.next)(value) }

  #[inline]
  fn error(self, err: Err) { (self.error)(err) }

  #[inline]
  fn complete(self) { (self.complete)() }

  #[inline]
  fn is_closed(&self) -> bool { false }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn shared_observer_terminates_once() {
    let log = Rc::new(RefCell::new(vec![]));
    let (l1, l2) = (log.clone(), log.clone());
    let o = AllObserver {
      next: move |v: i32| l1.borrow_mut().push(format!("{v}")),
      error: |_: ()| {},
      complete: move || l2.borrow_mut().push("done".to_string()),
    };
    let shared = MutRc::own(Some(o));
    let mut a = shared.clone();
    let b = shared.clone();
    a.next(1);
    a.complete();
    assert!(b.is_closed());
    b.complete();
    assert_eq!(*log.borrow(), vec!["1", "done"]);
  }

  #[test]
  fn boxed_observer_forwards() {
    let sum = Rc::new(RefCell::new(0));
    let s = sum.clone();
    let mut boxed: BoxedObserver<i32, Infallible> =
      Box::new(FnMutObserver(move |v| *s.borrow_mut() += v));
    boxed.next(2);
    boxed.next(3);
    assert!(!boxed.is_closed());
    boxed.complete();
    assert_eq!(*sum.borrow(), 5);
  }

  #[test]
  fn erased_paths_reach_the_inner_observer() {
    use crate::prelude::*;

    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    observable::create(|emitter: Emitter<i32, Infallible>| {
      emitter.next(1);
      emitter.complete();
    })
    .box_it()
    .subscribe(move |v| s.borrow_mut().push(v));

    let subject = Subject::<i32, Infallible>::new();
    let s = seen.clone();
    subject.clone().subscribe(move |v| s.borrow_mut().push(v * 10));
    subject.next(2);
    assert_eq!(*seen.borrow(), vec![1, 20]);
  }
}
