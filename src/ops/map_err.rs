use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};

#[derive(Clone)]
pub struct MapErrOp<S, F, Err> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _hint: TypeHint<Err>,
}

pub struct MapErrObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, E2, O, S, F> Observable<Item, E2, O> for MapErrOp<S, F, Err>
where
  S: Observable<Item, Err, MapErrObserver<O, F>>,
  F: FnOnce(Err) -> E2,
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(MapErrObserver { observer, func: self.func })
  }
}

impl<Item, Err, E2, S, F> ObservableExt<Item, E2> for MapErrOp<S, F, Err>
where
  S: ObservableExt<Item, Err>,
  F: FnOnce(Err) -> E2,
{
}

impl<Item, Err, E2, O, F> Observer<Item, Err> for MapErrObserver<O, F>
where
  O: Observer<Item, E2>,
  F: FnOnce(Err) -> E2,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { self.observer.error((self.func)(err)) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn error_is_converted() {
    let err = Rc::new(RefCell::new(None));
    let e = err.clone();
    observable::throw_err::<i32, _>(7)
      .map_err(|code| RxError::Source(format!("code {code}")))
      .subscribe_all(|_| {}, move |v| *e.borrow_mut() = Some(v), || {});
    assert_eq!(*err.borrow(), Some(RxError::Source("code 7".into())));
  }
}
