use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  scheduler::{Duration, Scheduler, TaskHandle},
  subscription::{Subscription, TupleSubscription},
};
use tracing::trace;

/// Emits a value only once `duration` has passed without another value
/// arriving. On completion the pending value, if any, is emitted right away
/// before completing; on error it is dropped.
#[derive(Clone)]
pub struct DebounceOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) duration: Duration,
  pub(crate) scheduler: Sch,
}

pub struct DebounceObserver<O, Sch, Item> {
  observer: MutRc<Option<O>>,
  pending: MutRc<Option<Item>>,
  timer: MutRc<Option<TaskHandle>>,
  duration: Duration,
  scheduler: Sch,
}

impl<Item, Err, O, S, Sch> Observable<Item, Err, O> for DebounceOp<S, Sch>
where
  O: Observer<Item, Err> + 'static,
  S: Observable<Item, Err, DebounceObserver<O, Sch, Item>>,
  Sch: Scheduler,
  Item: 'static,
{
  type Unsub = TupleSubscription<S::Unsub, MutRc<Option<TaskHandle>>>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let timer = MutRc::own(None);
    let observer = DebounceObserver {
      observer: MutRc::own(Some(observer)),
      pending: MutRc::own(None),
      timer: timer.clone(),
      duration: self.duration,
      scheduler: self.scheduler,
    };
    TupleSubscription::new(self.source.actual_subscribe(observer), timer)
  }
}

impl<Item, Err, S, Sch> ObservableExt<Item, Err> for DebounceOp<S, Sch> where S: ObservableExt<Item, Err> {}

impl<O, Sch, Item> DebounceObserver<O, Sch, Item> {
  fn cancel_timer(&self) {
    let timer = self.timer.rc_deref_mut().take();
    if let Some(timer) = timer {
      timer.unsubscribe();
    }
  }
}

impl<Item, Err, O, Sch> Observer<Item, Err> for DebounceObserver<O, Sch, Item>
where
  O: Observer<Item, Err> + 'static,
  Sch: Scheduler,
  Item: 'static,
{
  fn next(&mut self, value: Item) {
    self.cancel_timer();
    *self.pending.rc_deref_mut() = Some(value);
    let mut observer = self.observer.clone();
    let pending = self.pending.clone();
    let handle = self.scheduler.schedule(
      move || {
        let value = pending.rc_deref_mut().take();
        if let Some(value) = value {
          observer.next(value);
        }
      },
      Some(self.duration),
    );
    *self.timer.rc_deref_mut() = Some(handle);
  }

  fn error(self, err: Err) {
    self.cancel_timer();
    self.pending.rc_deref_mut().take();
    self.observer.error(err)
  }

  fn complete(mut self) {
    self.cancel_timer();
    let pending = self.pending.rc_deref_mut().take();
    if let Some(value) = pending {
      trace!("debounce flushing pending value on completion");
      self.observer.next(value);
    }
    self.observer.complete()
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}
