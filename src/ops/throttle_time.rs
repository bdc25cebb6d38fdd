use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  scheduler::{Duration, Scheduler, TaskHandle},
  subscription::{Subscription, TupleSubscription},
};

/// Which value of a throttle window is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThrottleEdge {
  /// Emit the value that opens the window, drop the rest.
  #[default]
  Leading,
  /// Emit the latest value seen when the window closes.
  Trailing,
}

/// Limits the rate of emissions to at most one per `duration` window.
///
/// A window opens with the first value after an idle period. Its timer is
/// released when the source terminates or the subscription is dropped; with
/// [`ThrottleEdge::Trailing`] a value still held at completion is emitted
/// before completing.
#[derive(Clone)]
pub struct ThrottleTimeOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) duration: Duration,
  pub(crate) edge: ThrottleEdge,
  pub(crate) scheduler: Sch,
}

pub struct ThrottleTimeObserver<O, Sch, Item> {
  observer: MutRc<Option<O>>,
  trailing: MutRc<Option<Item>>,
  window: MutRc<Option<TaskHandle>>,
  duration: Duration,
  edge: ThrottleEdge,
  scheduler: Sch,
}

impl<Item, Err, O, S, Sch> Observable<Item, Err, O> for ThrottleTimeOp<S, Sch>
where
  O: Observer<Item, Err> + 'static,
  S: Observable<Item, Err, ThrottleTimeObserver<O, Sch, Item>>,
  Sch: Scheduler,
  Item: 'static,
{
  type Unsub = TupleSubscription<S::Unsub, MutRc<Option<TaskHandle>>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let window = MutRc::own(None);
    let observer = ThrottleTimeObserver {
      observer: MutRc::own(Some(observer)),
      trailing: MutRc::own(None),
      window: window.clone(),
      duration: self.duration,
      edge: self.edge,
      scheduler: self.scheduler,
    };
    TupleSubscription::new(self.source.actual_subscribe(observer), window)
  }
}

impl<Item, Err, S, Sch> ObservableExt<Item, Err> for ThrottleTimeOp<S, Sch> where S: ObservableExt<Item, Err> {}

impl<O, Sch: Scheduler, Item: 'static> ThrottleTimeObserver<O, Sch, Item> {
  fn open_window<Err>(&self)
  where
    O: Observer<Item, Err> + 'static,
  {
    let mut observer = self.observer.clone();
    let trailing = self.trailing.clone();
    let window = self.window.clone();
    let handle = self.scheduler.schedule(
      move || {
        window.rc_deref_mut().take();
        let value = trailing.rc_deref_mut().take();
        if let Some(value) = value {
          observer.next(value);
        }
      },
      Some(self.duration),
    );
    *self.window.rc_deref_mut() = Some(handle);
  }

  fn close_window(&self) {
    let window = self.window.rc_deref_mut().take();
    if let Some(window) = window {
      window.unsubscribe();
    }
  }
}

impl<Item, Err, O, Sch> Observer<Item, Err> for ThrottleTimeObserver<O, Sch, Item>
where
  O: Observer<Item, Err> + 'static,
  Sch: Scheduler,
  Item: 'static,
{
  fn next(&mut self, value: Item) {
    let idle = self.window.rc_deref().is_none();
    match self.edge {
      ThrottleEdge::Leading => {
        if idle {
          self.observer.next(value);
          self.open_window::<Err>();
        }
      }
      ThrottleEdge::Trailing => {
        *self.trailing.rc_deref_mut() = Some(value);
        if idle {
          self.open_window::<Err>();
        }
      }
    }
  }

  fn error(self, err: Err) {
    self.close_window();
    self.trailing.rc_deref_mut().take();
    self.observer.error(err)
  }

  fn complete(mut self) {
    self.close_window();
    let trailing = self.trailing.rc_deref_mut().take();
    if let Some(value) = trailing {
      self.observer.next(value);
    }
    self.observer.complete()
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  fn ticks(scheduler: &TestScheduler, edge: ThrottleEdge) -> Rc<RefCell<Vec<usize>>> {
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    observable::interval(Duration::from_millis(1), scheduler.clone())
      .take(10)
      .throttle_time(Duration::from_millis(4), edge, scheduler.clone())
      .subscribe(move |v| o.borrow_mut().push(v));
    out
  }

  #[test]
  fn leading_edge() {
    let scheduler = TestScheduler::new();
    let out = ticks(&scheduler, ThrottleEdge::Leading);
    scheduler.advance_by(Duration::from_millis(20));
    // values 0..10 arrive at 1ms..10ms; windows open at 1, 5 and 9
    assert_eq!(*out.borrow(), vec![0, 4, 8]);
  }

  #[test]
  fn trailing_edge() {
    let scheduler = TestScheduler::new();
    let out = ticks(&scheduler, ThrottleEdge::Trailing);
    scheduler.advance_by(Duration::from_millis(20));
    // windows [1, 5) [5, 9) [9, 10]; the last one is flushed on completion
    assert_eq!(*out.borrow(), vec![3, 7, 9]);
    assert_eq!(scheduler.pending_count(), 0);
  }
}
