use crate::{
  observable::{of, Observable, ObservableExt, ObservableOf},
  observer::Observer,
  subscription::{Subscription, SubscriptionSlot, TupleSubscription},
  type_hint::TypeHint,
};

/// What a failed stream continues with.
pub trait ErrorRecovery<Err> {
  type Fallback;

  fn recover(self, err: Err) -> Self::Fallback;
}

/// Continue with the stream built from the error.
#[derive(Clone)]
pub struct RecoverWith<F>(pub(crate) F);

/// Emit one value, then complete.
#[derive(Clone)]
pub struct FallbackValue<T>(pub(crate) T);

/// Continue with a fixed stream; the error is discarded.
#[derive(Clone)]
pub struct FallbackObservable<S>(pub(crate) S);

impl<Err, F, S> ErrorRecovery<Err> for RecoverWith<F>
where
  F: FnOnce(Err) -> S,
{
  type Fallback = S;

  fn recover(self, err: Err) -> S { (self.0)(err) }
}

impl<Err, T> ErrorRecovery<Err> for FallbackValue<T> {
  type Fallback = ObservableOf<T>;

  fn recover(self, _: Err) -> ObservableOf<T> { of(self.0) }
}

impl<Err, S> ErrorRecovery<Err> for FallbackObservable<S> {
  type Fallback = S;

  fn recover(self, _: Err) -> S { self.0 }
}

/// Replaces the error of the source with the stream its recovery provides.
/// Values emitted before the error stay emitted; the source subscription is
/// done by the time the fallback is subscribed.
#[derive(Clone)]
pub struct CatchErrorOp<S, R, Err> {
  pub(crate) source: S,
  pub(crate) recovery: R,
  pub(crate) _hint: TypeHint<Err>,
}

pub struct CatchErrorObserver<O, R, Err2> {
  observer: O,
  recovery: R,
  fallback_slot: SubscriptionSlot,
  _hint: TypeHint<Err2>,
}

impl<Item, Err, Err2, O, S, R> Observable<Item, Err2, O> for CatchErrorOp<S, R, Err>
where
  O: Observer<Item, Err2>,
  S: Observable<Item, Err, CatchErrorObserver<O, R, Err2>>,
  S::Unsub: 'static,
  R: ErrorRecovery<Err>,
  R::Fallback: Observable<Item, Err2, O>,
  <R::Fallback as Observable<Item, Err2, O>>::Unsub: 'static,
{
  type Unsub = TupleSubscription<SubscriptionSlot, SubscriptionSlot>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let source_slot = SubscriptionSlot::default();
    let fallback_slot = SubscriptionSlot::default();
    let observer = CatchErrorObserver {
      observer,
      recovery: self.recovery,
      fallback_slot: fallback_slot.clone(),
      _hint: TypeHint::new(),
    };
    source_slot.replace(self.source.actual_subscribe(observer));
    TupleSubscription::new(source_slot, fallback_slot)
  }
}

impl<Item, Err, Err2, S, R> ObservableExt<Item, Err2> for CatchErrorOp<S, R, Err>
where
  S: ObservableExt<Item, Err>,
  R: ErrorRecovery<Err>,
  R::Fallback: ObservableExt<Item, Err2>,
{
}

impl<Item, Err, Err2, O, R> Observer<Item, Err> for CatchErrorObserver<O, R, Err2>
where
  O: Observer<Item, Err2>,
  R: ErrorRecovery<Err>,
  R::Fallback: Observable<Item, Err2, O>,
  <R::Fallback as Observable<Item, Err2, O>>::Unsub: 'static,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    if self.fallback_slot.is_closed() {
      return;
    }
    let fallback = self.recovery.recover(err);
    self.fallback_slot.replace(fallback.actual_subscribe(self.observer));
  }

  #[inline]
  fn complete(self) { self.observer.complete() }

  #[inline]
  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;

  #[test]
  fn fallback_value_on_immediate_error() {
    let mut out = vec![];
    let mut completed = false;
    observable::throw_err::<i32, &'static str>("down")
      .fallback_value(0)
      .subscribe_all(|v| out.push(v), |_| {}, || completed = true);
    assert_eq!(out, vec![0]);
    assert!(completed);
  }

  #[test]
  fn fallback_keeps_earlier_values() {
    let mut out = vec![];
    observable::from_iter(1..=2)
      .map_err(|e: Infallible| -> &'static str { match e {} })
      .concat(observable::throw_err("down"))
      .fallback_with(observable::from_iter(vec![9, 10]))
      .subscribe(|v| out.push(v));
    assert_eq!(out, vec![1, 2, 9, 10]);
  }

  #[test]
  fn catch_error_builds_fallback_from_the_error() {
    let mut out = vec![];
    observable::throw_err::<String, RxError>(RxError::Source("timeout".into()))
      .catch_error(|err| observable::of(err.to_string()))
      .subscribe(|v| out.push(v));
    assert_eq!(out.len(), 1);
    assert!(out[0].contains("timeout"));
  }

  #[test]
  fn fallback_errors_propagate() {
    let mut err = None;
    observable::throw_err::<i32, &'static str>("first")
      .catch_error(|_| observable::throw_err::<i32, &'static str>("second"))
      .subscribe_all(|_| {}, |e| err = Some(e), || {});
    assert_eq!(err, Some("second"));
  }
}
