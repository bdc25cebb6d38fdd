use super::{Subject, SubjectSubscription};
use crate::{
  error::ConfigError,
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  scheduler::{Duration, Scheduler},
};
use std::{collections::VecDeque, rc::Rc};

type Clock = Rc<dyn Fn() -> Duration>;

/// How much history a [`ReplaySubject`] keeps.
///
/// ```rust
/// use rxcore::prelude::*;
///
/// let scheduler = TestScheduler::new();
/// let config = ReplayConfig::default()
///   .buffer_size(10)
///   .window(Duration::from_secs(1), scheduler);
/// let subject = ReplaySubject::<i32, Infallible>::with_config(config).unwrap();
/// ```
#[derive(Clone, Default)]
pub struct ReplayConfig {
  buffer_size: Option<usize>,
  window: Option<(Duration, Clock)>,
}

impl ReplayConfig {
  /// Keep at most `size` values.
  pub fn buffer_size(mut self, size: usize) -> Self {
    self.buffer_size = Some(size);
    self
  }

  /// Replay only values younger than `window`, measured on `scheduler`.
  pub fn window<Sch: Scheduler>(mut self, window: Duration, scheduler: Sch) -> Self {
    self.window = Some((window, Rc::new(move || scheduler.now())));
    self
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.buffer_size == Some(0) {
      return Err(ConfigError::ZeroCount { operator: "ReplaySubject" });
    }
    if matches!(self.window, Some((w, _)) if w.is_zero()) {
      return Err(ConfigError::ZeroDuration { operator: "ReplaySubject" });
    }
    Ok(())
  }
}

struct ReplayBuffer<Item> {
  config: ReplayConfig,
  values: VecDeque<(Duration, Item)>,
}

impl<Item> ReplayBuffer<Item> {
  fn now(&self) -> Duration { self.config.window.as_ref().map_or(Duration::ZERO, |(_, clock)| clock()) }

  fn push(&mut self, value: Item) {
    let stamp = self.now();
    self.values.push_back((stamp, value));
    if let Some(size) = self.config.buffer_size {
      while self.values.len() > size {
        self.values.pop_front();
      }
    }
    self.trim_expired();
  }

  fn trim_expired(&mut self) {
    if let Some((window, clock)) = &self.config.window {
      let now = clock();
      while matches!(self.values.front(), Some((stamp, _)) if now.saturating_sub(*stamp) > *window) {
        self.values.pop_front();
      }
    }
  }
}

/// A subject that replays buffered values to every new subscriber before
/// live values, including after completion.
pub struct ReplaySubject<Item, Err> {
  subject: Subject<Item, Err>,
  buffer: MutRc<ReplayBuffer<Item>>,
}

impl<Item, Err> Clone for ReplaySubject<Item, Err> {
  fn clone(&self) -> Self { ReplaySubject { subject: self.subject.clone(), buffer: self.buffer.clone() } }
}

impl<Item, Err> Default for ReplaySubject<Item, Err> {
  fn default() -> Self { Self::from_valid(ReplayConfig::default()) }
}

impl<Item, Err> ReplaySubject<Item, Err> {
  /// A replay subject with unbounded history.
  pub fn new() -> Self { Self::default() }

  /// Keep the last `size` values. `size` must be greater than zero.
  pub fn with_buffer_size(size: usize) -> Result<Self, ConfigError> {
    Self::with_config(ReplayConfig::default().buffer_size(size))
  }

  pub fn with_config(config: ReplayConfig) -> Result<Self, ConfigError> {
    config.validate()?;
    Ok(Self::from_valid(config))
  }

  fn from_valid(config: ReplayConfig) -> Self {
    ReplaySubject {
      subject: Subject::new(),
      buffer: MutRc::own(ReplayBuffer { config, values: VecDeque::new() }),
    }
  }

  pub fn observer_count(&self) -> usize { self.subject.observer_count() }

  pub fn is_stopped(&self) -> bool { self.subject.is_stopped() }

  /// Number of values that would be replayed to a subscriber right now.
  pub fn buffered_len(&self) -> usize {
    let mut buffer = self.buffer.rc_deref_mut();
    buffer.trim_expired();
    buffer.values.len()
  }
}

impl<Item: Clone, Err: Clone> ReplaySubject<Item, Err> {
  pub fn next(&self, value: Item) {
    if self.subject.is_stopped() {
      return;
    }
    self.buffer.rc_deref_mut().push(value.clone());
    self.subject.next(value);
  }

  pub fn emit_error(&self, err: Err) { self.subject.emit_error(err) }

  pub fn emit_complete(&self) { self.subject.emit_complete() }
}

impl<Item: Clone, Err: Clone> Observer<Item, Err> for ReplaySubject<Item, Err> {
  #[inline]
  fn next(&mut self, value: Item) { ReplaySubject::next(self, value) }

  #[inline]
  fn error(self, err: Err) { ReplaySubject::emit_error(&self, err) }

  #[inline]
  fn complete(self) { ReplaySubject::emit_complete(&self) }

  #[inline]
  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<Item, Err, O> Observable<Item, Err, O> for ReplaySubject<Item, Err>
where
  O: Observer<Item, Err> + 'static,
  Item: Clone,
  Err: Clone,
{
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    let replay: Vec<Item> = {
      let mut buffer = self.buffer.rc_deref_mut();
      buffer.trim_expired();
      buffer.values.iter().map(|(_, v)| v.clone()).collect()
    };
    for v in replay {
      if observer.is_closed() {
        return SubjectSubscription::closed();
      }
      observer.next(v);
    }
    if observer.is_closed() {
      return SubjectSubscription::closed();
    }
    self.subject.actual_subscribe(observer)
  }
}

impl<Item, Err> ObservableExt<Item, Err> for ReplaySubject<Item, Err> {}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  fn collect(subject: &ReplaySubject<i32, Infallible>) -> Rc<RefCell<Vec<i32>>> {
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    subject.clone().subscribe(move |v| s.borrow_mut().push(v));
    seen
  }

  #[test]
  fn bounded_buffer_replays_latest() {
    let subject = ReplaySubject::<i32, Infallible>::with_buffer_size(2).unwrap();
    subject.next(1);
    subject.next(2);
    subject.next(3);
    let seen = collect(&subject);
    subject.next(4);
    assert_eq!(*seen.borrow(), vec![2, 3, 4]);
  }

  #[test]
  fn replays_after_completion() {
    let subject = ReplaySubject::<i32, Infallible>::new();
    subject.next(1);
    subject.next(2);
    subject.emit_complete();
    let completed = Rc::new(RefCell::new(false));
    let seen = Rc::new(RefCell::new(vec![]));
    let (s, c) = (seen.clone(), completed.clone());
    subject.clone().subscribe_all(move |v| s.borrow_mut().push(v), |_| {}, move || *c.borrow_mut() = true);
    assert_eq!(*seen.borrow(), vec![1, 2]);
    assert!(*completed.borrow());
  }

  #[test]
  fn window_drops_expired_values() {
    let scheduler = TestScheduler::new();
    let config = ReplayConfig::default().window(Duration::from_millis(100), scheduler.clone());
    let subject = ReplaySubject::<i32, Infallible>::with_config(config).unwrap();
    subject.next(1);
    scheduler.advance_by(Duration::from_millis(60));
    subject.next(2);
    scheduler.advance_by(Duration::from_millis(60));
    assert_eq!(subject.buffered_len(), 1);
    let seen = collect(&subject);
    assert_eq!(*seen.borrow(), vec![2]);
  }

  #[test]
  fn zero_sizes_are_rejected() {
    assert_eq!(
      ReplaySubject::<i32, Infallible>::with_buffer_size(0).err(),
      Some(ConfigError::ZeroCount { operator: "ReplaySubject" })
    );
    let config = ReplayConfig::default().window(Duration::ZERO, TestScheduler::new());
    assert!(matches!(
      ReplaySubject::<i32, Infallible>::with_config(config),
      Err(ConfigError::ZeroDuration { .. })
    ));
  }
}
