//! Side-effect hooks on the notifications of a stream.

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  type_hint::TypeHint,
};
use std::convert::Infallible;

/// Consumes the error of the source. Downstream sees an infallible stream
/// that simply stops when the source fails.
#[derive(Clone)]
pub struct OnErrorOp<S, F, Err> {
  pub(crate) source: S,
  pub(crate) func: F,
  pub(crate) _hint: TypeHint<Err>,
}

pub struct OnErrorObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, S, F> Observable<Item, Infallible, O> for OnErrorOp<S, F, Err>
where
  O: Observer<Item, Infallible>,
  S: Observable<Item, Err, OnErrorObserver<O, F>>,
  F: FnOnce(Err),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(OnErrorObserver { observer, func: self.func })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Infallible> for OnErrorOp<S, F, Err>
where
  S: ObservableExt<Item, Err>,
  F: FnOnce(Err),
{
}

impl<Item, Err, O, F> Observer<Item, Err> for OnErrorObserver<O, F>
where
  O: Observer<Item, Infallible>,
  F: FnOnce(Err),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { (self.func)(err) }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// Runs `func` right before the completion is forwarded.
#[derive(Clone)]
pub struct OnCompleteOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

pub struct OnCompleteObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for OnCompleteOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, OnCompleteObserver<O, F>>,
  F: FnOnce(),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(OnCompleteObserver { observer, func: self.func })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for OnCompleteOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnOnce(),
{
}

impl<Item, Err, O, F> Observer<Item, Err> for OnCompleteObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnOnce(),
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  #[inline]
  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) {
    (self.func)();
    self.observer.complete()
  }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[derive(Clone)]
pub struct TapOp<S, F> {
  pub(crate) source: S,
  pub(crate) func: F,
}

pub struct TapObserver<O, F> {
  observer: O,
  func: F,
}

impl<Item, Err, O, S, F> Observable<Item, Err, O> for TapOp<S, F>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, TapObserver<O, F>>,
  F: FnMut(&Item),
{
  type Unsub = S::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    self.source.actual_subscribe(TapObserver { observer, func: self.func })
  }
}

impl<Item, Err, S, F> ObservableExt<Item, Err> for TapOp<S, F>
where
  S: ObservableExt<Item, Err>,
  F: FnMut(&Item),
{
}

impl<Item, Err, O, F> Observer<Item, Err> for TapObserver<O, F>
where
  O: Observer<Item, Err>,
  F: FnMut(&Item),
{
  fn next(&mut self, value: Item) {
    (self.func)(&value);
    self.observer.next(value)
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
  fn on_error_makes_stream_infallible() {
    let mut out = vec![];
    let mut handled = None;
    observable::from_iter(0..2)
      .map_err(|e: Infallible| -> &'static str { match e {} })
      .concat(observable::throw_err("bad"))
      .on_error(|e| handled = Some(e))
      .subscribe(|v| out.push(v));
    assert_eq!(out, vec![0, 1]);
    assert_eq!(handled, Some("bad"));
  }

  #[test]
  fn on_complete_runs_once() {
    let mut calls = 0;
    observable::from_iter(0..3).on_complete(|| calls += 1).subscribe(|_| {});
    assert_eq!(calls, 1);
  }

  #[test]
  fn tap_sees_every_value() {
    let mut seen = vec![];
    let mut out = vec![];
    observable::from_iter(1..4).tap(|v| seen.push(*v)).map(|v| v * 10).subscribe(|v| out.push(v));
    assert_eq!(seen, vec![1, 2, 3]);
    assert_eq!(out, vec![10, 20, 30]);
  }
}
