use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
};
use std::convert::Infallible;

/// Creates an observable that produces values from an iterator.
///
/// Completes when all elements have been emitted. Stops early, without
/// completing, as soon as the observer is closed, so unbounded iterators are
/// fine in front of `take` or `take_while`.
///
/// ```rust
/// use rxcore::prelude::*;
///
/// observable::from_iter(0..)
///   .take(3)
///   .subscribe(|v| println!("{v}"));
/// ```
pub fn from_iter<Iter>(iter: Iter) -> ObservableIter<Iter>
where
  Iter: IntoIterator,
{
  ObservableIter(iter)
}

#[derive(Clone)]
pub struct ObservableIter<Iter>(Iter);

impl<Iter, Err, O> Observable<Iter::Item, Err, O> for ObservableIter<Iter>
where
  Iter: IntoIterator,
  O: Observer<Iter::Item, Err>,
{
  type Unsub = ();

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    for v in self.0 {
      if observer.is_closed() {
        return;
      }
      observer.next(v);
    }
    if !observer.is_closed() {
      observer.complete();
    }
  }
}

impl<Iter: IntoIterator> ObservableExt<Iter::Item, Infallible> for ObservableIter<Iter> {}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{
    cell::{Cell, RefCell},
    rc::Rc,
  };

  #[test]
  fn from_range() {
    let hit_count = Rc::new(Cell::new(0));
    let completed = Rc::new(Cell::new(false));
    let (h, c) = (hit_count.clone(), completed.clone());
    observable::from_iter(0..100).subscribe_all(
      move |_| h.set(h.get() + 1),
      |_: Infallible| {},
      move || c.set(true),
    );
    assert_eq!(hit_count.get(), 100);
    assert!(completed.get());
  }

  #[test]
  fn from_vec_in_order() {
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    observable::from_iter(vec!["a", "b", "c"]).subscribe(move |v| s.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
  }
}
