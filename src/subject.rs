//! Subjects are both observers and observables: they multicast every
//! notification they receive to all current subscribers.

use crate::{
  observable::{Observable, ObservableExt},
  observer::{BoxedObserver, Observer},
  rc::{MutRc, WeakRc},
  subscription::Subscription,
};
use smallvec::SmallVec;
use std::collections::VecDeque;

mod behavior_subject;
mod replay_subject;
mod subscribers;
pub use behavior_subject::*;
pub use replay_subject::*;
pub use subscribers::*;

enum Notification<Item, Err> {
  Next(Item),
  Error(Err),
  Complete,
}

#[derive(Clone)]
enum Terminal<Err> {
  Error(Err),
  Complete,
}

struct SubjectCore<Item, Err> {
  observers: Subscribers<BoxedObserver<Item, Err>>,
  terminal: Option<Terminal<Err>>,
  emitting: bool,
  queue: VecDeque<Notification<Item, Err>>,
  removed: SmallVec<[usize; 1]>,
}

/// A hot multicast node without buffering.
///
/// Notifications are forwarded synchronously to every registered observer in
/// subscription order. Observers subscribing after a terminal notification
/// receive only that terminal. Notifications pushed from inside a broadcast
/// (by a subscriber reacting to a value) are queued and delivered, in order,
/// once the current broadcast finishes.
pub struct Subject<Item, Err>(MutRc<SubjectCore<Item, Err>>);

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject(self.0.clone()) }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self {
    Subject(MutRc::own(SubjectCore {
      observers: Subscribers::default(),
      terminal: None,
      emitting: false,
      queue: VecDeque::new(),
      removed: SmallVec::new(),
    }))
  }
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Self::default() }

  /// Number of observers currently registered.
  pub fn observer_count(&self) -> usize {
    let core = self.0.rc_deref();
    core.observers.len().saturating_sub(core.removed.len())
  }

  /// True once `error` or `complete` was called.
  pub fn is_stopped(&self) -> bool { self.0.rc_deref().terminal.is_some() }

  fn was_removed(&self, id: usize) -> bool { self.0.rc_deref().removed.contains(&id) }
}

impl<Item: Clone, Err: Clone> Subject<Item, Err> {
  pub fn next(&self, value: Item) {
    {
      let mut core = self.0.rc_deref_mut();
      if core.terminal.is_some() {
        return;
      }
      if core.emitting {
        core.queue.push_back(Notification::Next(value));
        return;
      }
      core.emitting = true;
    }
    self.drain(Notification::Next(value));
  }

  /// Broadcasts `err` and stops the subject. Same as [`Observer::error`]
  /// without consuming this handle.
  pub fn emit_error(&self, err: Err) {
    {
      let mut core = self.0.rc_deref_mut();
      if core.terminal.is_some() {
        return;
      }
      core.terminal = Some(Terminal::Error(err.clone()));
      if core.emitting {
        core.queue.push_back(Notification::Error(err));
        return;
      }
      core.emitting = true;
    }
    self.drain(Notification::Error(err));
  }

  /// Broadcasts completion and stops the subject.
  pub fn emit_complete(&self) {
    {
      let mut core = self.0.rc_deref_mut();
      if core.terminal.is_some() {
        return;
      }
      core.terminal = Some(Terminal::Complete);
      if core.emitting {
        core.queue.push_back(Notification::Complete);
        return;
      }
      core.emitting = true;
    }
    self.drain(Notification::Complete);
  }

  fn drain(&self, first: Notification<Item, Err>) {
    let mut notification = first;
    loop {
      // Observers run with the core released, so they may subscribe,
      // unsubscribe or emit on this subject.
      let mut observers = self.0.rc_deref_mut().observers.take_entries();
      match notification {
        Notification::Next(value) => {
          let last = observers.len().saturating_sub(1);
          for (idx, (id, observer)) in observers.iter_mut().enumerate() {
            if self.was_removed(*id) || observer.is_closed() {
              continue;
            }
            if idx == last {
              observer.next(value);
              break;
            }
            observer.next(value.clone());
          }
        }
        Notification::Error(err) => {
          for (id, observer) in observers.drain(..) {
            if !self.was_removed(id) {
              observer.error(err.clone());
            }
          }
        }
        Notification::Complete => {
          for (id, observer) in observers.drain(..) {
            if !self.was_removed(id) {
              observer.complete();
            }
          }
        }
      }

      let mut core = self.0.rc_deref_mut();
      core.observers.restore(observers);
      let removed = std::mem::take(&mut core.removed);
      core.observers.retain(|(id, o)| !removed.contains(id) && !o.is_closed());
      match core.queue.pop_front() {
        Some(n) => notification = n,
        None => {
          core.emitting = false;
          return;
        }
      }
    }
  }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for Subject<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { Subject::next(self, value) }

  #[inline]
  fn error(self, err: Err) { Subject::emit_error(&self, err) }

  #[inline]
  fn complete(self) { Subject::emit_complete(&self) }

  #[inline]
  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<Item, Err, O> Observable<Item, Err, O> for Subject<Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Err: Clone,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let mut core = self.0.rc_deref_mut();
    match core.terminal.clone() {
      Some(Terminal::Error(err)) => {
        drop(core);
        observer.error(err);
        SubjectSubscription::closed()
      }
      Some(Terminal::Complete) => {
        drop(core);
        observer.complete();
        SubjectSubscription::closed()
      }
      None => {
        let id = core.observers.add(Box::new(observer));
        SubjectSubscription { subject: Some(self.0.downgrade()), id }
      }
    }
  }
}

impl<Item, Err> ObservableExt<Item, Err> for Subject<Item, Err> {}

/// Registration of one observer on a subject.
pub struct SubjectSubscription<Item, Err> {
  subject: Option<WeakRc<SubjectCore<Item, Err>>>,
  id: usize,
}

impl<Item, Err> SubjectSubscription<Item, Err> {
  pub(crate) fn closed() -> Self { SubjectSubscription { subject: None, id: 0 } }
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(self) {
    let Some(core) = self.subject.and_then(|s| s.upgrade()) else {
      return;
    };
    let mut core = core.rc_deref_mut();
    let removed = core.observers.remove(self.id);
    if removed.is_none() && core.emitting && !core.removed.contains(&self.id) {
      core.removed.push(self.id);
    }
    drop(core);
    drop(removed);
  }

  fn is_closed(&self) -> bool {
    let Some(core) = self.subject.as_ref().and_then(|s| s.upgrade()) else {
      return true;
    };
    let core = core.rc_deref();
    if core.emitting {
      core.removed.contains(&self.id)
    } else {
      !core.observers.contains(self.id)
    }
  }
}
