use crate::{
  observable::{Observable, ObservableExt},
  ops::throttle_time::{ThrottleEdge, ThrottleTimeOp},
  scheduler::Duration,
};

/// After a value arrives, waits `duration` and then emits the most recent
/// value seen in that time. Shares its machinery with the trailing edge of
/// `throttle_time`.
#[derive(Clone)]
pub struct AuditTimeOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) duration: Duration,
  pub(crate) scheduler: Sch,
}

impl<Item, Err, O, S, Sch> Observable<Item, Err, O> for AuditTimeOp<S, Sch>
where
  ThrottleTimeOp<S, Sch>: Observable<Item, Err, O>,
{
  type Unsub = <ThrottleTimeOp<S, Sch> as Observable<Item, Err, O>>::Unsub;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let throttle = ThrottleTimeOp {
      source: self.source,
      duration: self.duration,
      edge: ThrottleEdge::Trailing,
      scheduler: self.scheduler,
    };
    throttle.actual_subscribe(observer)
  }
}

impl<Item, Err, S, Sch> ObservableExt<Item, Err> for AuditTimeOp<S, Sch> where S: ObservableExt<Item, Err> {}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn emits_latest_value_after_each_burst() {
    let scheduler = TestScheduler::new();
    let input = Subject::<&'static str, Infallible>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    input
      .clone()
      .audit_time(Duration::from_millis(10), scheduler.clone())
      .subscribe(move |v| o.borrow_mut().push(v));

    input.next("a");
    input.next("b");
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*out.borrow(), vec!["b"]);
    scheduler.advance_by(Duration::from_millis(30));
    input.next("c");
    scheduler.advance_by(Duration::from_millis(10));
    assert_eq!(*out.borrow(), vec!["b", "c"]);
  }
}
