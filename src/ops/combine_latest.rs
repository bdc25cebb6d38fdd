use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{LocalSubscription, Subscription},
  type_hint::TypeHint,
};

/// Combines the latest values of two streams with `func` whenever either
/// emits, once both have emitted at least once.
///
/// Completes when both sources complete, or as soon as one source completes
/// without ever emitting, since no combination can follow.
#[derive(Clone)]
pub struct CombineLatestOp<S1, S2, F, A, B> {
  pub(crate) source_a: S1,
  pub(crate) source_b: S2,
  pub(crate) func: F,
  pub(crate) _hint: TypeHint<(A, B)>,
}

struct CombineState<F, A, B> {
  a: Option<A>,
  b: Option<B>,
  func: F,
  a_done: bool,
  b_done: bool,
}

pub struct CombineLatestShared<O, F, A, B> {
  observer: MutRc<Option<O>>,
  state: MutRc<CombineState<F, A, B>>,
  subscription: LocalSubscription,
}

impl<O, F, A, B> Clone for CombineLatestShared<O, F, A, B> {
  fn clone(&self) -> Self {
    CombineLatestShared {
      observer: self.observer.clone(),
      state: self.state.clone(),
      subscription: self.subscription.clone(),
    }
  }
}

impl<O, F, A, B> CombineLatestShared<O, F, A, B> {
  fn combined<Out>(&self) -> Option<Out>
  where
    F: FnMut(A, B) -> Out,
    A: Clone,
    B: Clone,
  {
    let mut guard = self.state.rc_deref_mut();
    let state = &mut *guard;
    match (&state.a, &state.b) {
      (Some(a), Some(b)) => Some((state.func)(a.clone(), b.clone())),
      _ => None,
    }
  }

  fn emit<Out, Err>(&mut self, out: Option<Out>)
  where
    O: Observer<Out, Err>,
  {
    if let Some(out) = out {
      self.observer.next(out);
    }
  }

  fn fail<Out, Err>(self, err: Err)
  where
    O: Observer<Out, Err>,
  {
    self.observer.error(err);
    self.subscription.unsubscribe();
  }

  fn side_done<Out, Err, M>(self, mark: M)
  where
    O: Observer<Out, Err>,
    M: FnOnce(&mut CombineState<F, A, B>) -> bool,
  {
    let finished = {
      let mut state = self.state.rc_deref_mut();
      mark(&mut *state)
    };
    if finished {
      Observer::<Out, Err>::complete(self.observer);
      self.subscription.unsubscribe();
    }
  }
}

/// Observer of the first source.
pub struct CombineLatestA<O, F, A, B>(CombineLatestShared<O, F, A, B>);

/// Observer of the second source.
pub struct CombineLatestB<O, F, A, B>(CombineLatestShared<O, F, A, B>);

impl<A, B, Out, Err, O, S1, S2, F> Observable<Out, Err, O> for CombineLatestOp<S1, S2, F, A, B>
where
  O: Observer<Out, Err>,
  S1: Observable<A, Err, CombineLatestA<O, F, A, B>>,
  S1::Unsub: 'static,
  S2: Observable<B, Err, CombineLatestB<O, F, A, B>>,
  S2::Unsub: 'static,
  F: FnMut(A, B) -> Out,
  A: Clone,
  B: Clone,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let shared = CombineLatestShared {
      observer: MutRc::own(Some(observer)),
      state: MutRc::own(CombineState { a: None, b: None, func: self.func, a_done: false, b_done: false }),
      subscription: LocalSubscription::default(),
    };
    let subscription = shared.subscription.clone();
    subscription.add(self.source_a.actual_subscribe(CombineLatestA(shared.clone())));
    if !subscription.is_closed() {
      subscription.add(self.source_b.actual_subscribe(CombineLatestB(shared)));
    }
    subscription
  }
}

impl<A, B, Out, Err, S1, S2, F> ObservableExt<Out, Err> for CombineLatestOp<S1, S2, F, A, B>
where
  S1: ObservableExt<A, Err>,
  S2: ObservableExt<B, Err>,
  F: FnMut(A, B) -> Out,
{
}

impl<A, B, Out, Err, O, F> Observer<A, Err> for CombineLatestA<O, F, A, B>
where
  O: Observer<Out, Err>,
  F: FnMut(A, B) -> Out,
  A: Clone,
  B: Clone,
{
  fn next(&mut self, value: A) {
    self.0.state.rc_deref_mut().a = Some(value);
    let out = self.0.combined();
    self.0.emit(out);
  }

  fn error(self, err: Err) { self.0.fail::<Out, Err>(err) }

  fn complete(self) {
    self.0.side_done::<Out, Err, _>(|state| {
      state.a_done = true;
      state.b_done || state.a.is_none()
    })
  }

  fn is_closed(&self) -> bool { Observer::<Out, Err>::is_closed(&self.0.observer) }
}

impl<A, B, Out, Err, O, F> Observer<B, Err> for CombineLatestB<O, F, A, B>
where
  O: Observer<Out, Err>,
  F: FnMut(A, B) -> Out,
  A: Clone,
  B: Clone,
{
  fn next(&mut self, value: B) {
    self.0.state.rc_deref_mut().b = Some(value);
    let out = self.0.combined();
    self.0.emit(out);
  }

  fn error(self, err: Err) { self.0.fail::<Out, Err>(err) }

  fn complete(self) {
    self.0.side_done::<Out, Err, _>(|state| {
      state.b_done = true;
      state.a_done || state.b.is_none()
    })
  }

  fn is_closed(&self) -> bool { Observer::<Out, Err>::is_closed(&self.0.observer) }
}
