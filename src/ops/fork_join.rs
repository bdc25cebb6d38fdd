use crate::{
  error::EmptyError,
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{LocalSubscription, Subscription},
};

/// Waits for both sources to complete, then emits their final values as one
/// tuple and completes.
///
/// A source that completes without a value fails the stream with
/// [`EmptyError`] converted into the stream's error type.
#[derive(Clone)]
pub struct ForkJoinOp<S1, S2> {
  pub(crate) source_a: S1,
  pub(crate) source_b: S2,
}

struct ForkJoinState<A, B> {
  a: Option<A>,
  b: Option<B>,
  a_done: bool,
  b_done: bool,
}

enum Outcome<A, B> {
  Pending,
  Empty,
  Joined(A, B),
}

pub struct ForkJoinShared<O, A, B> {
  observer: MutRc<Option<O>>,
  state: MutRc<ForkJoinState<A, B>>,
  subscription: LocalSubscription,
}

impl<O, A, B> Clone for ForkJoinShared<O, A, B> {
  fn clone(&self) -> Self {
    ForkJoinShared { observer: self.observer.clone(), state: self.state.clone(), subscription: self.subscription.clone() }
  }
}

impl<O, A, B> ForkJoinShared<O, A, B> {
  fn side_done<Err, M>(self, mark: M)
  where
    O: Observer<(A, B), Err>,
    Err: From<EmptyError>,
    M: FnOnce(&mut ForkJoinState<A, B>) -> bool,
  {
    let outcome = {
      let mut state = self.state.rc_deref_mut();
      if !mark(&mut *state) {
        Outcome::Empty
      } else if state.a_done && state.b_done {
        match (state.a.take(), state.b.take()) {
          (Some(a), Some(b)) => Outcome::Joined(a, b),
          _ => Outcome::Empty,
        }
      } else {
        Outcome::Pending
      }
    };
    match outcome {
      Outcome::Pending => return,
      Outcome::Empty => self.observer.error(Err::from(EmptyError)),
      Outcome::Joined(a, b) => {
        let observer = self.observer.rc_deref_mut().take();
        if let Some(mut observer) = observer {
          observer.next((a, b));
          observer.complete();
        }
      }
    }
    self.subscription.unsubscribe();
  }

  fn fail<Err>(self, err: Err)
  where
    O: Observer<(A, B), Err>,
  {
    self.observer.error(err);
    self.subscription.unsubscribe();
  }
}

pub struct ForkJoinA<O, A, B>(ForkJoinShared<O, A, B>);

pub struct ForkJoinB<O, A, B>(ForkJoinShared<O, A, B>);

impl<A, B, Err, O, S1, S2> Observable<(A, B), Err, O> for ForkJoinOp<S1, S2>
where
  O: Observer<(A, B), Err>,
  S1: Observable<A, Err, ForkJoinA<O, A, B>>,
  S1::Unsub: 'static,
  S2: Observable<B, Err, ForkJoinB<O, A, B>>,
  S2::Unsub: 'static,
  Err: From<EmptyError>,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let shared = ForkJoinShared {
      observer: MutRc::own(Some(observer)),
      state: MutRc::own(ForkJoinState { a: None, b: None, a_done: false, b_done: false }),
      subscription: LocalSubscription::default(),
    };
    let subscription = shared.subscription.clone();
    subscription.add(self.source_a.actual_subscribe(ForkJoinA(shared.clone())));
    if !subscription.is_closed() {
      subscription.add(self.source_b.actual_subscribe(ForkJoinB(shared)));
    }
    subscription
  }
}

impl<A, B, Err, S1, S2> ObservableExt<(A, B), Err> for ForkJoinOp<S1, S2>
where
  S1: ObservableExt<A, Err>,
  S2: ObservableExt<B, Err>,
  Err: From<EmptyError>,
{
}

impl<A, B, Err, O> Observer<A, Err> for ForkJoinA<O, A, B>
where
  O: Observer<(A, B), Err>,
  Err: From<EmptyError>,
{
  fn next(&mut self, value: A) { self.0.state.rc_deref_mut().a = Some(value); }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) {
    self.0.side_done::<Err, _>(|state| {
      state.a_done = true;
      state.a.is_some()
    })
  }

  fn is_closed(&self) -> bool { Observer::<(A, B), Err>::is_closed(&self.0.observer) }
}

impl<A, B, Err, O> Observer<B, Err> for ForkJoinB<O, A, B>
where
  O: Observer<(A, B), Err>,
  Err: From<EmptyError>,
{
  fn next(&mut self, value: B) { self.0.state.rc_deref_mut().b = Some(value); }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) {
    self.0.side_done::<Err, _>(|state| {
      state.b_done = true;
      state.b.is_some()
    })
  }

  fn is_closed(&self) -> bool { Observer::<(A, B), Err>::is_closed(&self.0.observer) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn joins_final_values() {
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    let a = Subject::<i32, RxError>::new();
    let b = Subject::<&'static str, RxError>::new();
    a.clone().fork_join(b.clone()).subscribe_all(move |v| o.borrow_mut().push(v), |_| {}, || {});
    a.next(1);
    b.next("x");
    a.next(2);
    a.complete();
    assert!(out.borrow().is_empty());
    b.next("y");
    b.complete();
    assert_eq!(*out.borrow(), vec![(2, "y")]);
  }

  #[test]
  fn empty_source_is_an_error() {
    let err = Rc::new(RefCell::new(None));
    let e = err.clone();
    let a = Subject::<i32, RxError>::new();
    let b = Subject::<i32, RxError>::new();
    a.clone().fork_join(b.clone()).subscribe_all(|_| {}, move |v| *e.borrow_mut() = Some(v), || {});
    a.next(1);
    b.complete();
    assert_eq!(*err.borrow(), Some(RxError::Empty(EmptyError)));
    assert_eq!(a.observer_count(), 0);
  }

  #[test]
  fn error_from_either_side_wins() {
    let err = Rc::new(RefCell::new(None));
    let e = err.clone();
    let a = Subject::<i32, String>::new();
    a.clone()
      .fork_join(observable::throw_err::<i32, String>("late".into()))
      .subscribe_all(|_| {}, move |v| *e.borrow_mut() = Some(v), || {});
    assert_eq!(err.borrow().as_deref(), Some("late"));
    assert_eq!(a.observer_count(), 0);
  }
}
