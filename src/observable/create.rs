use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  rc::MutRc,
  subscription::{BoxedSubscription, Subscription},
  type_hint::TypeHint,
};
use std::collections::VecDeque;

/// Creates an observable from a producer function.
///
/// The producer runs once per subscription. It receives an owned
/// [`Emitter`], which it may keep to emit asynchronously, and returns the
/// teardown of that execution: `()` for none, a `ClosureSubscription`, or any
/// other subscription. The teardown runs exactly once, on unsubscribe or right
/// after the emitter delivers `error`/`complete`.
///
/// ```rust
/// use rxcore::prelude::*;
/// use std::{cell::RefCell, rc::Rc};
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let s = seen.clone();
/// observable::create(|emitter| {
///   emitter.next(1);
///   emitter.next(2);
///   emitter.complete();
/// })
/// .subscribe(move |v| s.borrow_mut().push(v));
/// assert_eq!(*seen.borrow(), vec![1, 2]);
/// ```
pub fn create<F, Item, Err, U>(producer: F) -> Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription,
{
  Create { producer, _hint: TypeHint::new() }
}

/// Like [`create`], but the producer may fail synchronously. An `Err`
/// returned by the producer is delivered to the observer as `error`, unless
/// the stream already terminated.
pub fn try_create<F, Item, Err, U>(producer: F) -> TryCreate<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> Result<U, Err>,
  U: Subscription,
{
  TryCreate { producer, _hint: TypeHint::new() }
}

#[derive(Clone)]
pub struct Create<F, Item, Err> {
  producer: F,
  _hint: TypeHint<(Item, Err)>,
}

#[derive(Clone)]
pub struct TryCreate<F, Item, Err> {
  producer: F,
  _hint: TypeHint<(Item, Err)>,
}

enum Pending<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

struct EmitterState<Item, Err> {
  observer: Option<BoxedObserver<Item, Err>>,
  // A terminal was accepted; later notifications are ignored.
  stopped: bool,
  // Unsubscribed, or the terminal was delivered.
  closed: bool,
  emitting: bool,
  queue: VecDeque<Pending<Item, Err>>,
  teardown: Option<BoxedSubscription>,
}

/// The producer side of [`create`]. Clones share the same subscriber.
///
/// Notifications pushed while the subscriber is still handling a previous
/// one (for example from inside its `next`) are queued and delivered in
/// order once it returns. After a terminal notification or unsubscription
/// every call is a no-op.
pub struct Emitter<Item, Err>(MutRc<EmitterState<Item, Err>>);

impl<Item, Err> Clone for Emitter<Item, Err> {
  fn clone(&self) -> Self { Emitter(self.0.clone()) }
}

impl<Item, Err> Emitter<Item, Err> {
  fn new(observer: BoxedObserver<Item, Err>) -> Self {
    Emitter(MutRc::own(EmitterState {
      observer: Some(observer),
      stopped: false,
      closed: false,
      emitting: false,
      queue: VecDeque::new(),
      teardown: None,
    }))
  }

  pub fn next(&self, value: Item) {
    {
      let mut state = self.0.rc_deref_mut();
      if state.closed || state.stopped {
        return;
      }
      if state.emitting {
        state.queue.push_back(Pending::Next(value));
        return;
      }
      state.emitting = true;
    }
    self.drain(Pending::Next(value));
  }

  /// Delivers `err` through a shared handle. The consuming
  /// [`Observer::error`] does the same for the last use of an emitter.
  pub fn emit_error(&self, err: Err) { self.push_terminal(Pending::Error(err)) }

  pub fn emit_complete(&self) { self.push_terminal(Pending::Complete) }

  /// True once the stream terminated, was unsubscribed, or the downstream
  /// observer stopped accepting values.
  pub fn is_closed(&self) -> bool {
    let state = self.0.rc_deref();
    state.closed || state.stopped || state.observer.as_ref().map_or(false, |o| o.is_closed())
  }

  fn push_terminal(&self, terminal: Pending<Item, Err>) {
    {
      let mut state = self.0.rc_deref_mut();
      if state.closed || state.stopped {
        return;
      }
      state.stopped = true;
      if state.emitting {
        state.queue.push_back(terminal);
        return;
      }
      state.emitting = true;
    }
    self.drain(terminal);
  }

  // The observer is moved out while it runs, so downstream may emit on,
  // unsubscribe or inspect this emitter from inside a notification.
  fn drain(&self, first: Pending<Item, Err>) {
    let Some(mut observer) = self.0.rc_deref_mut().observer.take() else {
      self.0.rc_deref_mut().emitting = false;
      return;
    };
    let mut pending = first;
    loop {
      match pending {
        Pending::Next(value) => observer.next(value),
        Pending::Error(err) => {
          let teardown = self.finish();
          observer.error(err);
          if let Some(teardown) = teardown {
            teardown.unsubscribe();
          }
          return;
        }
        Pending::Complete => {
          let teardown = self.finish();
          observer.complete();
          if let Some(teardown) = teardown {
            teardown.unsubscribe();
          }
          return;
        }
      }
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        state.emitting = false;
        return;
      }
      match state.queue.pop_front() {
        Some(p) => pending = p,
        None => {
          state.emitting = false;
          state.observer = Some(observer);
          return;
        }
      }
    }
  }

  fn finish(&self) -> Option<BoxedSubscription> {
    let mut state = self.0.rc_deref_mut();
    state.closed = true;
    state.emitting = false;
    state.queue.clear();
    state.teardown.take()
  }

  fn set_teardown(&self, teardown: impl Subscription + 'static) {
    let mut state = self.0.rc_deref_mut();
    if state.closed {
      drop(state);
      teardown.unsubscribe();
    } else {
      state.teardown = Some(BoxedSubscription::new(teardown));
    }
  }
}

impl<Item, Err> Observer<Item, Err> for Emitter<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { Emitter::next(self, value) }

  #[inline]
  fn error(self, err: Err) { Emitter::emit_error(&self, err) }

  #[inline]
  fn complete(self) { Emitter::emit_complete(&self) }

  #[inline]
  fn is_closed(&self) -> bool { Emitter::is_closed(self) }
}

impl<Item, Err> Subscription for Emitter<Item, Err> {
  fn unsubscribe(self) {
    let (observer, queue, teardown) = {
      let mut state = self.0.rc_deref_mut();
      if state.closed {
        return;
      }
      state.closed = true;
      (state.observer.take(), std::mem::take(&mut state.queue), state.teardown.take())
    };
    drop(observer);
    drop(queue);
    if let Some(teardown) = teardown {
      teardown.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { self.0.rc_deref().closed }
}

impl<F, Item, Err, U, O> Observable<Item, Err, O> for Create<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> U,
  U: Subscription + 'static,
  O: Observer<Item, Err> + 'static,
{
  type Unsub = Emitter<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let emitter = Emitter::new(Box::new(observer));
    let teardown = (self.producer)(emitter.clone());
    emitter.set_teardown(teardown);
    emitter
  }
}

impl<F, Item, Err> ObservableExt<Item, Err> for Create<F, Item, Err> {}

impl<F, Item, Err, U, O> Observable<Item, Err, O> for TryCreate<F, Item, Err>
where
  F: FnOnce(Emitter<Item, Err>) -> Result<U, Err>,
  U: Subscription + 'static,
  O: Observer<Item, Err> + 'static,
{
  type Unsub = Emitter<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let emitter = Emitter::new(Box::new(observer));
    match (self.producer)(emitter.clone()) {
      Ok(teardown) => emitter.set_teardown(teardown),
      Err(err) => emitter.emit_error(err),
    }
    emitter
  }
}

impl<F, Item, Err> ObservableExt<Item, Err> for TryCreate<F, Item, Err> {}
