use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  scheduler::{Duration, Scheduler, TaskHandle},
};
use std::convert::Infallible;

/// Emits `()` once after `delay`, then completes.
pub fn timer<Sch: Scheduler>(delay: Duration, scheduler: Sch) -> ObservableTimer<Sch> {
  ObservableTimer { delay, scheduler }
}

/// Shortest period an interval ticks at. Smaller periods, zero included, are
/// raised to it so every tick moves the clock forward.
pub const MIN_INTERVAL_PERIOD: Duration = Duration::from_millis(1);

/// Emits an increasing index every `period`, starting one period after
/// subscription. Never completes on its own.
pub fn interval<Sch: Scheduler>(period: Duration, scheduler: Sch) -> ObservableInterval<Sch> {
  ObservableInterval { period: period.max(MIN_INTERVAL_PERIOD), delay: None, scheduler }
}

/// Like [`interval`], but the first value comes after `delay`.
pub fn interval_at<Sch: Scheduler>(
  delay: Duration, period: Duration, scheduler: Sch,
) -> ObservableInterval<Sch> {
  ObservableInterval { period: period.max(MIN_INTERVAL_PERIOD), delay: Some(delay), scheduler }
}

#[derive(Clone)]
pub struct ObservableTimer<Sch> {
  delay: Duration,
  scheduler: Sch,
}

impl<Err, O, Sch> Observable<(), Err, O> for ObservableTimer<Sch>
where
  O: Observer<(), Err> + 'static,
  Sch: Scheduler,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    self.scheduler.schedule(
      move || {
        observer.next(());
        observer.complete();
      },
      Some(self.delay),
    )
  }
}

impl<Sch> ObservableExt<(), Infallible> for ObservableTimer<Sch> {}

#[derive(Clone)]
pub struct ObservableInterval<Sch> {
  period: Duration,
  delay: Option<Duration>,
  scheduler: Sch,
}

impl<Err, O, Sch> Observable<usize, Err, O> for ObservableInterval<Sch>
where
  O: Observer<usize, Err> + 'static,
  Sch: Scheduler,
{
  type Unsub = TaskHandle;

  fn actual_subscribe(self, mut observer: O) -> Self::Unsub {
    self.scheduler.schedule_periodic(
      move |tick| {
        if observer.is_closed() {
          return false;
        }
        observer.next(tick);
        !observer.is_closed()
      },
      self.period,
      self.delay,
    )
  }
}

impl<Sch> ObservableExt<usize, Infallible> for ObservableInterval<Sch> {}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn timer_fires_once() {
    let scheduler = TestScheduler::new();
    let events = Rc::new(RefCell::new(vec![]));
    let (e1, e2) = (events.clone(), events.clone());
    observable::timer(Duration::from_millis(50), scheduler.clone()).subscribe_all(
      move |_| e1.borrow_mut().push("tick"),
      |_: Infallible| {},
      move || e2.borrow_mut().push("done"),
    );
    scheduler.advance_by(Duration::from_millis(49));
    assert!(events.borrow().is_empty());
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(*events.borrow(), vec!["tick", "done"]);
  }

  #[test]
  fn interval_until_unsubscribed() {
    let scheduler = TestScheduler::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    let subscription = observable::interval(Duration::from_millis(10), scheduler.clone())
      .subscribe(move |v| s.borrow_mut().push(v));
    scheduler.advance_by(Duration::from_millis(35));
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    subscription.unsubscribe();
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn zero_period_interval_still_advances() {
    let scheduler = TestScheduler::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    observable::interval(Duration::ZERO, scheduler.clone()).subscribe(move |v| s.borrow_mut().push(v));
    scheduler.advance_by(Duration::from_millis(3));
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
  }

  #[test]
  fn interval_at_starts_after_delay() {
    let scheduler = TestScheduler::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let (s, sch) = (seen.clone(), scheduler.clone());
    observable::interval_at(Duration::ZERO, Duration::from_millis(10), scheduler.clone())
      .take(2)
      .subscribe(move |v| s.borrow_mut().push((v, sch.now().as_millis())));
    scheduler.flush();
    assert_eq!(*seen.borrow(), vec![(0, 0), (1, 10)]);
  }

  #[cfg(feature = "futures-scheduler")]
  #[test]
  fn interval_on_local_pool() {
    use futures::executor::LocalPool;
    let mut pool = LocalPool::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let s = seen.clone();
    observable::interval(Duration::from_millis(1), pool.spawner())
      .take(5)
      .subscribe(move |v| s.borrow_mut().push(v));
    pool.run();
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
  }
}
