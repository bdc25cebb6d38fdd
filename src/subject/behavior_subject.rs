use super::{Subject, SubjectSubscription};
use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
};

/// A subject that always holds exactly one current value.
///
/// Every new subscriber synchronously receives the current value before any
/// live value. After a terminal notification, subscribers receive only that
/// terminal.
pub struct BehaviorSubject<Item, Err> {
  subject: Subject<Item, Err>,
  value: MutRc<Item>,
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { BehaviorSubject { subject: self.subject.clone(), value: self.value.clone() } }
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  pub fn new(initial: Item) -> Self { BehaviorSubject { subject: Subject::new(), value: MutRc::own(initial) } }

  pub fn observer_count(&self) -> usize { self.subject.observer_count() }

  pub fn is_stopped(&self) -> bool { self.subject.is_stopped() }
}

impl<Item: Clone, Err: Clone> BehaviorSubject<Item, Err> {
  /// The current value.
  pub fn value(&self) -> Item { self.value.rc_deref().clone() }

  pub fn next(&self, value: Item) {
    if self.subject.is_stopped() {
      return;
    }
    *self.value.rc_deref_mut() = value.clone();
    self.subject.next(value);
  }

  pub fn emit_error(&self, err: Err) { self.subject.emit_error(err) }

  pub fn emit_complete(&self) { self.subject.emit_complete() }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for BehaviorSubject<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { BehaviorSubject::next(self, value) }

  #[inline]
  fn error(self, err: Err) { BehaviorSubject::emit_error(&self, err) }

  #[inline]
  fn complete(self) { BehaviorSubject::emit_complete(&self) }

  #[inline]
  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<Item, Err, O> Observable<Item, Err, O> for BehaviorSubject<Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Item: Clone,
  Err: Clone,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    if !self.subject.is_stopped() {
      let current = self.value();
      observer.next(current);
      if observer.is_closed() {
        return SubjectSubscription::closed();
      }
    }
    self.subject.actual_subscribe(observer)
  }
}

impl<Item, Err> ObservableExt<Item, Err> for BehaviorSubject<Item, Err> {}
