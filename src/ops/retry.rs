//! Retry operator
//!
//! Resubscribes to the source after an error, as allowed by a
//! [`RetryPolicy`]. Each attempt runs against a fresh clone of the source;
//! the subscription of a failed attempt is released before the next attempt
//! starts. Values emitted before a failure are not replayed or retracted.
//!
//! Attempts that fail synchronously (inside their own subscribe call) are
//! trampolined, so a source that keeps failing on subscribe does not grow
//! the stack.

use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  scheduler::{Duration, Scheduler, TaskHandle},
  subscription::{Subscription, SubscriptionSlot},
};
use std::rc::Rc;
use tracing::debug;

/// Decides whether, and after how long, a failed stream is resubscribed.
pub trait RetryPolicy<Err>: Clone {
  /// `attempt` counts the retries already made for this subscription.
  /// Returns the delay before the next attempt, or `None` to give up and
  /// forward `err`.
  fn should_retry(&self, err: &Err, attempt: usize) -> Option<Duration>;

  /// Whether a successful value resets the attempt counter.
  fn reset_on_success(&self) -> bool { false }
}

/// A plain count: retry immediately, at most that many times.
impl<Err> RetryPolicy<Err> for usize {
  fn should_retry(&self, _: &Err, attempt: usize) -> Option<Duration> {
    (attempt < *self).then_some(Duration::ZERO)
  }
}

/// Builder-style retry policy.
///
/// ```rust
/// use rxcore::prelude::*;
///
/// let policy = RetryConfig::new().count(3).delay(Duration::from_millis(200)).reset_on_success();
/// assert_eq!(RetryPolicy::<()>::should_retry(&policy, &(), 2), Some(Duration::from_millis(200)));
/// assert_eq!(RetryPolicy::<()>::should_retry(&policy, &(), 3), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryConfig {
  count: Option<usize>,
  delay: Option<Duration>,
  reset_on_success: bool,
}

impl RetryConfig {
  /// Unlimited immediate retries.
  pub fn new() -> Self { Self::default() }

  pub fn count(mut self, count: usize) -> Self {
    self.count = Some(count);
    self
  }

  pub fn delay(mut self, delay: Duration) -> Self {
    self.delay = Some(delay);
    self
  }

  pub fn reset_on_success(mut self) -> Self {
    self.reset_on_success = true;
    self
  }
}

impl<Err> RetryPolicy<Err> for RetryConfig {
  fn should_retry(&self, _: &Err, attempt: usize) -> Option<Duration> {
    match self.count {
      Some(count) if attempt >= count => None,
      _ => Some(self.delay.unwrap_or(Duration::ZERO)),
    }
  }

  fn reset_on_success(&self) -> bool { self.reset_on_success }
}

type Delayer = Rc<dyn Fn(Duration, Box<dyn FnOnce()>) -> TaskHandle>;

#[derive(Clone)]
pub struct RetryOp<S, P> {
  source: S,
  policy: P,
  delayer: Option<Delayer>,
}

impl<S, P> RetryOp<S, P> {
  /// Delays returned by the policy are ignored.
  pub(crate) fn immediate(source: S, policy: P) -> Self { RetryOp { source, policy, delayer: None } }

  /// Non-zero delays returned by the policy are waited for on `scheduler`.
  pub(crate) fn delayed<Sch: Scheduler>(source: S, policy: P, scheduler: Sch) -> Self {
    let delayer: Delayer =
      Rc::new(move |delay: Duration, task: Box<dyn FnOnce()>| scheduler.schedule(task, Some(delay)));
    RetryOp { source, policy, delayer: Some(delayer) }
  }
}

struct Trampoline<T> {
  running: bool,
  queued: Option<T>,
  // Bumped on every retried failure. An attempt whose subscribe call sees it
  // change has already failed, and the slot belongs to its successor.
  generation: usize,
}

pub struct RetryObserver<O, S, P> {
  observer: O,
  source: S,
  policy: P,
  attempts: usize,
  serial: SubscriptionSlot,
  delayer: Option<Delayer>,
  trampoline: MutRc<Trampoline<Self>>,
  // Captured where the source bound is known, so the observer impl does not
  // have to repeat it.
  subscribe_fn: fn(Self),
}

impl<O, S, P> RetryObserver<O, S, P> {
  fn subscribe_attempt<Item, Err>(self)
  where
    S: Observable<Item, Err, Self> + Clone,
    S::Unsub: 'static,
  {
    let serial = self.serial.clone();
    if serial.is_closed() {
      return;
    }
    let source = self.source.clone();
    let trampoline = self.trampoline.clone();
    let generation = trampoline.rc_deref().generation;
    let attempt = source.actual_subscribe(self);
    if trampoline.rc_deref().generation == generation {
      serial.replace(attempt);
    } else {
      attempt.unsubscribe();
    }
  }

  fn drive(this: Self) {
    let trampoline = this.trampoline.clone();
    {
      let mut state = trampoline.rc_deref_mut();
      if state.running {
        state.queued = Some(this);
        return;
      }
      state.running = true;
    }
    let mut next = Some(this);
    while let Some(attempt) = next {
      (attempt.subscribe_fn)(attempt);
      next = trampoline.rc_deref_mut().queued.take();
    }
    trampoline.rc_deref_mut().running = false;
  }
}

impl<Item, Err, O, S, P> Observable<Item, Err, O> for RetryOp<S, P>
where
  O: Observer<Item, Err> + 'static,
  S: Observable<Item, Err, RetryObserver<O, S, P>> + Clone + 'static,
  S::Unsub: 'static,
  P: RetryPolicy<Err> + 'static,
{
  type Unsub = SubscriptionSlot;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let serial = SubscriptionSlot::default();
    let first = RetryObserver {
      observer,
      source: self.source,
      policy: self.policy,
      attempts: 0,
      serial: serial.clone(),
      delayer: self.delayer,
      trampoline: MutRc::own(Trampoline { running: false, queued: None, generation: 0 }),
      subscribe_fn: RetryObserver::subscribe_attempt::<Item, Err>,
    };
    RetryObserver::drive(first);
    serial
  }
}

impl<Item, Err, S, P> ObservableExt<Item, Err> for RetryOp<S, P> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O, S, P> Observer<Item, Err> for RetryObserver<O, S, P>
where
  O: Observer<Item, Err> + 'static,
  S: 'static,
  P: RetryPolicy<Err> + 'static,
{
  fn next(&mut self, value: Item) {
    if self.attempts > 0 && self.policy.reset_on_success() {
      self.attempts = 0;
    }
    self.observer.next(value)
  }

  fn error(mut self, err: Err) {
    let Some(delay) = self.policy.should_retry(&err, self.attempts) else {
      debug!(attempts = self.attempts, "retries exhausted, forwarding error");
      let serial = self.serial.clone();
      self.observer.error(err);
      serial.unsubscribe();
      return;
    };
    self.attempts += 1;
    self.trampoline.rc_deref_mut().generation += 1;
    debug!(attempt = self.attempts, ?delay, "resubscribing after error");
    // Release the failed attempt before starting the next one.
    self.serial.replace(());
    if self.serial.is_closed() {
      return;
    }
    match self.delayer.clone() {
      Some(delayer) if !delay.is_zero() => {
        let serial = self.serial.clone();
        let handle = delayer(delay, Box::new(move || RetryObserver::drive(self)));
        serial.replace(handle);
      }
      _ => RetryObserver::drive(self),
    }
  }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.serial.is_closed() || self.observer.is_closed() }
}
