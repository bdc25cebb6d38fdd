//! Type-erased observables.

use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  subscription::BoxedSubscription,
};

/// Object-safe observable: subscribes a boxed observer, returns a boxed
/// subscription.
pub trait DynObservable<Item, Err> {
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription;
}

/// Object-safe observable that can also be cloned, for sources that are
/// subscribed more than once after erasure.
pub trait DynCloneObservable<Item, Err>: DynObservable<Item, Err> {
  fn box_clone(&self) -> Box<dyn DynCloneObservable<Item, Err>>;
}

impl<Item, Err, S> DynObservable<Item, Err> for S
where
  S: Observable<Item, Err, BoxedObserver<Item, Err>>,
  S::Unsub: 'static,
{
  fn box_subscribe(self: Box<Self>, observer: BoxedObserver<Item, Err>) -> BoxedSubscription {
    BoxedSubscription::new((*self).actual_subscribe(observer))
  }
}

impl<Item, Err, S> DynCloneObservable<Item, Err> for S
where
  S: Observable<Item, Err, BoxedObserver<Item, Err>> + Clone + 'static,
  S::Unsub: 'static,
{
  fn box_clone(&self) -> Box<dyn DynCloneObservable<Item, Err>> { Box::new(self.clone()) }
}

/// An observable whose concrete type has been erased.
pub struct BoxOp<Item, Err>(Box<dyn DynObservable<Item, Err>>);

/// A clonable erased observable.
pub struct CloneBoxOp<Item, Err>(Box<dyn DynCloneObservable<Item, Err>>);

impl<Item, Err> BoxOp<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item, Err, BoxedObserver<Item, Err>> + 'static,
    S::Unsub: 'static,
  {
    BoxOp(Box::new(source))
  }
}

impl<Item, Err> CloneBoxOp<Item, Err> {
  pub fn new<S>(source: S) -> Self
  where
    S: Observable<Item, Err, BoxedObserver<Item, Err>> + Clone + 'static,
    S::Unsub: 'static,
  {
    CloneBoxOp(Box::new(source))
  }
}

/// Observables that can be erased into a [`BoxOp`].
pub trait IntoBoxOp<Item, Err> {
  fn into_box_op(self) -> BoxOp<Item, Err>;
}

impl<Item, Err, S> IntoBoxOp<Item, Err> for S
where
  S: Observable<Item, Err, BoxedObserver<Item, Err>> + 'static,
  S::Unsub: 'static,
{
  fn into_box_op(self) -> BoxOp<Item, Err> { BoxOp::new(self) }
}

/// Observables that can be erased into a [`CloneBoxOp`].
pub trait IntoCloneBoxOp<Item, Err> {
  fn into_clone_box_op(self) -> CloneBoxOp<Item, Err>;
}

impl<Item, Err, S> IntoCloneBoxOp<Item, Err> for S
where
  S: Observable<Item, Err, BoxedObserver<Item, Err>> + Clone + 'static,
  S::Unsub: 'static,
{
  fn into_clone_box_op(self) -> CloneBoxOp<Item, Err> { CloneBoxOp::new(self) }
}

impl<Item, Err> Clone for CloneBoxOp<Item, Err> {
  fn clone(&self) -> Self { CloneBoxOp(self.0.box_clone()) }
}

impl<Item, Err, O> Observable<Item, Err, O> for BoxOp<Item, Err>
where
  O: Observer<Item, Err> + 'static,
{
  type Unsub = BoxedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.box_subscribe(Box::new(observer)) }
}

impl<Item, Err, O> Observable<Item, Err, O> for CloneBoxOp<Item, Err>
where
  O: Observer<Item, Err> + 'static,
{
  type Unsub = BoxedSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { self.0.box_subscribe(Box::new(observer)) }
}

impl<Item, Err> ObservableExt<Item, Err> for BoxOp<Item, Err> {}

impl<Item, Err> ObservableExt<Item, Err> for CloneBoxOp<Item, Err> {}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn heterogeneous_sources_in_one_vec() {
    let sources: Vec<BoxOp<i32, Infallible>> = vec![
      observable::of(1).box_it(),
      observable::from_iter(2..4).box_it(),
      observable::from_iter(0..10).filter(|v| *v > 7).box_it(),
    ];
    let seen = Rc::new(RefCell::new(vec![]));
    for source in sources {
      let s = seen.clone();
      source.subscribe(move |v| s.borrow_mut().push(v));
    }
    assert_eq!(*seen.borrow(), vec![1, 2, 3, 8, 9]);
  }

  #[test]
  fn clone_box_resubscribes() {
    let source = observable::from_iter(0..3).map(|v| v * 10).clone_box_it();
    let seen = Rc::new(RefCell::new(vec![]));
    let (s1, s2) = (seen.clone(), seen.clone());
    source.clone().subscribe(move |v| s1.borrow_mut().push(v));
    source.subscribe(move |v| s2.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec![0, 10, 20, 0, 10, 20]);
  }
}
