use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subject::Subject,
  subscription::{BoxedSubscription, Subscription},
};
use tracing::debug;

struct RefCountState<S, Sub> {
  source: S,
  subject: Sub,
  // Builds the subject of each new connection; `None` keeps one subject for
  // the lifetime of the operator.
  fresh: Option<fn() -> Sub>,
  connection: Option<BoxedSubscription>,
  subscribers: usize,
  // Bumped with every fresh subject. Subscribers of an older subject have
  // already been terminated and no longer count.
  epoch: usize,
}

/// Multicasts `source` through a subject, connecting when the first observer
/// subscribes and disconnecting when the last one unsubscribes.
///
/// Clones share the same connection.
pub struct RefCountOp<S, Sub>(MutRc<RefCountState<S, Sub>>);

/// Ref-counted multicast that starts every connection on a fresh [`Subject`],
/// so a subscriber arriving after a disconnect, or after the source
/// terminated, triggers a brand new subscription to the source.
pub type ShareOp<S, Item, Err> = RefCountOp<S, Subject<Item, Err>>;

impl<S, Sub> Clone for RefCountOp<S, Sub> {
  fn clone(&self) -> Self { RefCountOp(self.0.clone()) }
}

impl<S, Sub> RefCountOp<S, Sub> {
  pub(crate) fn with_subject(source: S, subject: Sub) -> Self {
    RefCountOp(MutRc::own(RefCountState { source, subject, fresh: None, connection: None, subscribers: 0, epoch: 0 }))
  }

  /// Number of observers currently subscribed through this operator.
  pub fn subscriber_count(&self) -> usize { self.0.rc_deref().subscribers }

  /// Whether the source is currently subscribed.
  pub fn is_connected(&self) -> bool { self.0.rc_deref().connection.as_ref().map_or(false, |c| !c.is_closed()) }
}

impl<S, Item, Err> RefCountOp<S, Subject<Item, Err>> {
  pub fn new(source: S) -> Self {
    RefCountOp(MutRc::own(RefCountState {
      source,
      subject: Subject::new(),
      fresh: Some(Subject::new),
      connection: None,
      subscribers: 0,
      epoch: 0,
    }))
  }
}

/// Subscription handed out by [`RefCountOp`]; unsubscribing the last one
/// disconnects the source.
pub struct RefCountSubscription<U, S, Sub> {
  subscription: U,
  state: MutRc<RefCountState<S, Sub>>,
  epoch: usize,
}

impl<Item, Err, O, S, Sub> Observable<Item, Err, O> for RefCountOp<S, Sub>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, Sub> + Clone,
  S::Unsub: 'static,
  Sub: Observable<Item, Err, O> + Observer<Item, Err> + Clone,
{
  type Unsub = RefCountSubscription<Sub::Unsub, S, Sub>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let (subject, connect, epoch) = {
      let mut state = self.0.rc_deref_mut();
      let connect = match state.fresh {
        Some(fresh) if state.connection.is_none() || Observer::<Item, Err>::is_closed(&state.subject) => {
          state.subject = fresh();
          state.epoch += 1;
          state.subscribers = 0;
          true
        }
        Some(_) => false,
        None => state.connection.is_none(),
      };
      state.subscribers += 1;
      (state.subject.clone(), connect, state.epoch)
    };

    let subscription = subject.clone().actual_subscribe(observer);
    if connect {
      let (source, stale) = {
        let mut state = self.0.rc_deref_mut();
        (state.source.clone(), state.connection.take())
      };
      if let Some(stale) = stale {
        stale.unsubscribe();
      }
      debug!("first subscriber, connecting shared source");
      let connection = BoxedSubscription::new(source.actual_subscribe(subject));
      let mut state = self.0.rc_deref_mut();
      if state.subscribers == 0 {
        // Everyone left while the source was running synchronously.
        drop(state);
        connection.unsubscribe();
      } else {
        state.connection = Some(connection);
      }
    }
    RefCountSubscription { subscription, state: self.0, epoch }
  }
}

impl<Item, Err, S, Sub> ObservableExt<Item, Err> for RefCountOp<S, Sub> where S: ObservableExt<Item, Err> {}

impl<U, S, Sub> Subscription for RefCountSubscription<U, S, Sub>
where
  U: Subscription,
{
  fn unsubscribe(self) {
    self.subscription.unsubscribe();
    let connection = {
      let mut state = self.state.rc_deref_mut();
      if state.epoch != self.epoch {
        return;
      }
      state.subscribers = state.subscribers.saturating_sub(1);
      if state.subscribers == 0 { state.connection.take() } else { None }
    };
    if let Some(connection) = connection {
      debug!("last subscriber left, disconnecting shared source");
      connection.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.subscription.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[derive(Default)]
  struct Upstream {
    subscribed: usize,
    torn_down: usize,
    emitter: Option<Emitter<i32, Infallible>>,
  }

  /// A source that records its subscriptions and teardowns and exposes the
  /// emitter of its latest execution.
  fn upstream(
    log: Rc<RefCell<Upstream>>,
  ) -> Create<impl FnOnce(Emitter<i32, Infallible>) -> ClosureSubscription<Box<dyn FnOnce()>> + Clone, i32, Infallible>
  {
    observable::create(move |emitter: Emitter<i32, Infallible>| {
      let mut state = log.borrow_mut();
      state.subscribed += 1;
      state.emitter = Some(emitter);
      let log = log.clone();
      ClosureSubscription(Box::new(move || log.borrow_mut().torn_down += 1) as Box<dyn FnOnce()>)
    })
  }

  fn emit(log: &Rc<RefCell<Upstream>>, value: i32) {
    let emitter = log.borrow().emitter.clone();
    if let Some(emitter) = emitter {
      emitter.next(value);
    }
  }

  #[test]
  fn subscribers_share_one_execution() {
    let log = Rc::new(RefCell::new(Upstream::default()));
    let shared = upstream(log.clone()).share();

    let first = Rc::new(RefCell::new(vec![]));
    let second = Rc::new(RefCell::new(vec![]));
    let (f, s) = (first.clone(), second.clone());
    shared.clone().subscribe(move |v| f.borrow_mut().push(v));
    emit(&log, 1);
    shared.subscribe(move |v| s.borrow_mut().push(v));
    emit(&log, 2);

    assert_eq!(log.borrow().subscribed, 1);
    assert_eq!(*first.borrow(), vec![1, 2]);
    assert_eq!(*second.borrow(), vec![2]);
  }

  #[test]
  fn last_unsubscribe_tears_down_once_and_resubscribe_reconnects() {
    let log = Rc::new(RefCell::new(Upstream::default()));
    let shared = upstream(log.clone()).share();

    let first = shared.clone().subscribe(|_| {});
    let second = shared.clone().subscribe(|_| {});
    first.unsubscribe();
    assert_eq!(log.borrow().torn_down, 0);
    assert!(shared.is_connected());
    second.unsubscribe();
    assert_eq!(log.borrow().torn_down, 1);
    assert!(!shared.is_connected());
    assert_eq!(shared.subscriber_count(), 0);

    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    let third = shared.subscribe(move |v| o.borrow_mut().push(v));
    assert_eq!(log.borrow().subscribed, 2);
    emit(&log, 5);
    assert_eq!(*out.borrow(), vec![5]);
    third.unsubscribe();
    assert_eq!(log.borrow().torn_down, 2);
  }

  #[test]
  fn reconnects_after_the_source_completed() {
    let subscriptions = Rc::new(RefCell::new(0));
    let s = subscriptions.clone();
    let shared = observable::defer(move || {
      *s.borrow_mut() += 1;
      observable::from_iter(1..=2)
    })
    .share();

    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    shared.clone().subscribe(move |v| o.borrow_mut().push(v));
    let o = out.clone();
    shared.subscribe(move |v| o.borrow_mut().push(v));
    assert_eq!(*subscriptions.borrow(), 2);
    assert_eq!(*out.borrow(), vec![1, 2, 1, 2]);
  }

  #[test]
  fn reconnection_after_completion_is_torn_down_by_its_own_subscribers() {
    let runs = Rc::new(RefCell::new(0));
    let torn = Rc::new(RefCell::new(0));
    let (r, t) = (runs.clone(), torn.clone());
    let shared = observable::create(move |emitter: Emitter<i32, Infallible>| {
      *r.borrow_mut() += 1;
      if *r.borrow() == 1 {
        emitter.next(1);
        emitter.emit_complete();
      }
      let t = t.clone();
      ClosureSubscription(move || *t.borrow_mut() += 1)
    })
    .share();

    let completed = Rc::new(RefCell::new(false));
    let c = completed.clone();
    let first = shared.clone().subscribe_all(|_| {}, |_| {}, move || *c.borrow_mut() = true);
    assert!(*completed.borrow());
    assert_eq!(*torn.borrow(), 1);

    let second = shared.clone().subscribe(|_| {});
    assert_eq!(*runs.borrow(), 2);
    assert!(shared.is_connected());
    second.unsubscribe();
    assert!(!shared.is_connected());
    assert_eq!(*torn.borrow(), 2);

    first.unsubscribe();
    assert_eq!(shared.subscriber_count(), 0);
    assert_eq!(*torn.borrow(), 2);
  }
}
