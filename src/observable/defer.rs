use crate::observable::{Observable, ObservableExt};

/// Creates an observable that calls `factory` to build a fresh source for
/// each subscription.
///
/// ```rust
/// use rxcore::prelude::*;
/// use std::{cell::Cell, rc::Rc};
///
/// let calls = Rc::new(Cell::new(0));
/// let c = calls.clone();
/// let source = observable::defer(move || {
///   c.set(c.get() + 1);
///   observable::of(c.get())
/// });
/// source.clone().subscribe(|v| assert_eq!(v, 1));
/// source.subscribe(|v| assert_eq!(v, 2));
/// ```
pub fn defer<F, S>(factory: F) -> ObservableDefer<F>
where
  F: Fn() -> S,
{
  ObservableDefer(factory)
}

#[derive(Clone)]
pub struct ObservableDefer<F>(F);

impl<Item, Err, O, F, S> Observable<Item, Err, O> for ObservableDefer<F>
where
  F: Fn() -> S,
  S: Observable<Item, Err, O>,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub { (self.0)().actual_subscribe(observer) }
}

impl<Item, Err, F, S> ObservableExt<Item, Err> for ObservableDefer<F>
where
  F: Fn() -> S,
  S: ObservableExt<Item, Err>,
{
}
