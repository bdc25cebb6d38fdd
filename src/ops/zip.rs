use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{LocalSubscription, Subscription},
};
use std::collections::VecDeque;

/// Pairs the values of two streams by index.
///
/// Unmatched values wait in a queue until the other side catches up. The
/// stream completes as soon as a completed source has no queued values
/// left, dropping whatever the other side still buffers.
#[derive(Clone)]
pub struct ZipOp<S1, S2> {
  pub(crate) source_a: S1,
  pub(crate) source_b: S2,
}

struct ZipState<A, B> {
  a: VecDeque<A>,
  b: VecDeque<B>,
  a_done: bool,
  b_done: bool,
}

impl<A, B> ZipState<A, B> {
  fn pair(&mut self) -> Option<(A, B)> {
    if self.a.is_empty() || self.b.is_empty() {
      return None;
    }
    self.a.pop_front().zip(self.b.pop_front())
  }

  fn exhausted(&self) -> bool { (self.a_done && self.a.is_empty()) || (self.b_done && self.b.is_empty()) }
}

pub struct ZipShared<O, A, B> {
  observer: MutRc<Option<O>>,
  state: MutRc<ZipState<A, B>>,
  subscription: LocalSubscription,
}

impl<O, A, B> Clone for ZipShared<O, A, B> {
  fn clone(&self) -> Self {
    ZipShared { observer: self.observer.clone(), state: self.state.clone(), subscription: self.subscription.clone() }
  }
}

impl<O, A, B> ZipShared<O, A, B> {
  fn push<Err, M>(&mut self, push: M)
  where
    O: Observer<(A, B), Err>,
    M: FnOnce(&mut ZipState<A, B>),
  {
    let (pair, exhausted) = {
      let mut state = self.state.rc_deref_mut();
      push(&mut *state);
      let pair = state.pair();
      (pair, state.exhausted())
    };
    if let Some(pair) = pair {
      self.observer.next(pair);
    }
    if exhausted {
      self.finish::<Err>();
    }
  }

  fn finish<Err>(&self)
  where
    O: Observer<(A, B), Err>,
  {
    Observer::<(A, B), Err>::complete(self.observer.clone());
    self.subscription.clone().unsubscribe();
  }

  fn fail<Err>(self, err: Err)
  where
    O: Observer<(A, B), Err>,
  {
    self.observer.error(err);
    self.subscription.unsubscribe();
  }

  fn side_done<Err, M>(self, mark: M)
  where
    O: Observer<(A, B), Err>,
    M: FnOnce(&mut ZipState<A, B>),
  {
    let exhausted = {
      let mut state = self.state.rc_deref_mut();
      mark(&mut *state);
      state.exhausted()
    };
    if exhausted {
      self.finish::<Err>();
    }
  }
}

pub struct ZipA<O, A, B>(ZipShared<O, A, B>);

pub struct ZipB<O, A, B>(ZipShared<O, A, B>);

impl<A, B, Err, O, S1, S2> Observable<(A, B), Err, O> for ZipOp<S1, S2>
where
  O: Observer<(A, B), Err>,
  S1: Observable<A, Err, ZipA<O, A, B>>,
  S1::Unsub: 'static,
  S2: Observable<B, Err, ZipB<O, A, B>>,
  S2::Unsub: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let shared = ZipShared {
      observer: MutRc::own(Some(observer)),
      state: MutRc::own(ZipState { a: VecDeque::new(), b: VecDeque::new(), a_done: false, b_done: false }),
      subscription: LocalSubscription::default(),
    };
    let subscription = shared.subscription.clone();
    subscription.add(self.source_a.actual_subscribe(ZipA(shared.clone())));
    if !subscription.is_closed() {
      subscription.add(self.source_b.actual_subscribe(ZipB(shared)));
    }
    subscription
  }
}

impl<A, B, Err, S1, S2> ObservableExt<(A, B), Err> for ZipOp<S1, S2>
where
  S1: ObservableExt<A, Err>,
  S2: ObservableExt<B, Err>,
{
}

impl<A, B, Err, O> Observer<A, Err> for ZipA<O, A, B>
where
  O: Observer<(A, B), Err>,
{
  fn next(&mut self, value: A) { self.0.push::<Err, _>(|state| state.a.push_back(value)) }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) { self.0.side_done::<Err, _>(|state| state.a_done = true) }

  fn is_closed(&self) -> bool { Observer::<(A, B), Err>::is_closed(&self.0.observer) }
}

impl<A, B, Err, O> Observer<B, Err> for ZipB<O, A, B>
where
  O: Observer<(A, B), Err>,
{
  fn next(&mut self, value: B) { self.0.push::<Err, _>(|state| state.b.push_back(value)) }

  fn error(self, err: Err) { self.0.fail(err) }

  fn complete(self) { self.0.side_done::<Err, _>(|state| state.b_done = true) }

  fn is_closed(&self) -> bool { Observer::<(A, B), Err>::is_closed(&self.0.observer) }
}
