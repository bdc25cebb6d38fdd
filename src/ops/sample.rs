use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  scheduler::{Duration, Scheduler, TaskHandle},
  subscription::{LocalSubscription, Subscription, TupleSubscription},
  type_hint::TypeHint,
};

/// Every `period`, emits the most recent source value if one arrived since
/// the previous sample. A value still unsampled when the source completes is
/// dropped, and the sampling timer is released.
#[derive(Clone)]
pub struct SampleTimeOp<S, Sch> {
  pub(crate) source: S,
  pub(crate) period: Duration,
  pub(crate) scheduler: Sch,
}

pub struct SampleTimeObserver<O, Item> {
  observer: MutRc<Option<O>>,
  latest: MutRc<Option<Item>>,
  ticker: TaskHandle,
}

impl<Item, Err, O, S, Sch> Observable<Item, Err, O> for SampleTimeOp<S, Sch>
where
  O: Observer<Item, Err> + 'static,
  S: Observable<Item, Err, SampleTimeObserver<O, Item>>,
  Sch: Scheduler,
  Item: 'static,
{
  type Unsub = TupleSubscription<S::Unsub, TaskHandle>;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let observer = MutRc::own(Some(observer));
    let latest = MutRc::own(None);
    let ticker = {
      let mut observer = observer.clone();
      let latest = latest.clone();
      self.scheduler.schedule_periodic(
        move |_| {
          let value = latest.rc_deref_mut().take();
          if let Some(value) = value {
            observer.next(value);
          }
          !Observer::<Item, Err>::is_closed(&observer)
        },
        self.period,
        None,
      )
    };
    let sampler = SampleTimeObserver { observer, latest, ticker: ticker.clone() };
    TupleSubscription::new(self.source.actual_subscribe(sampler), ticker)
  }
}

impl<Item, Err, S, Sch> ObservableExt<Item, Err> for SampleTimeOp<S, Sch> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O> Observer<Item, Err> for SampleTimeObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { *self.latest.rc_deref_mut() = Some(value); }

  fn error(self, err: Err) {
    self.ticker.unsubscribe();
    self.observer.error(err)
  }

  fn complete(self) {
    self.ticker.unsubscribe();
    self.latest.rc_deref_mut().take();
    self.observer.complete()
  }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

/// Whenever `notifier` emits, emits the most recent source value if one
/// arrived since the previous sample. Completion of the notifier is ignored;
/// an error from either side fails the stream.
#[derive(Clone)]
pub struct SampleOp<S, N, NItem> {
  pub(crate) source: S,
  pub(crate) notifier: N,
  pub(crate) _hint: TypeHint<NItem>,
}

pub struct SampleShared<O, Item> {
  observer: MutRc<Option<O>>,
  latest: MutRc<Option<Item>>,
  subscription: LocalSubscription,
}

impl<O, Item> Clone for SampleShared<O, Item> {
  fn clone(&self) -> Self {
    SampleShared { observer: self.observer.clone(), latest: self.latest.clone(), subscription: self.subscription.clone() }
  }
}

pub struct SampleSource<O, Item>(SampleShared<O, Item>);

pub struct SampleNotifier<O, Item>(SampleShared<O, Item>);

impl<Item, NItem, Err, O, S, N> Observable<Item, Err, O> for SampleOp<S, N, NItem>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, SampleSource<O, Item>>,
  S::Unsub: 'static,
  N: Observable<NItem, Err, SampleNotifier<O, Item>>,
  N::Unsub: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let shared = SampleShared {
      observer: MutRc::own(Some(observer)),
      latest: MutRc::own(None),
      subscription: LocalSubscription::default(),
    };
    let subscription = shared.subscription.clone();
    subscription.add(self.source.actual_subscribe(SampleSource(shared.clone())));
    if !subscription.is_closed() {
      subscription.add(self.notifier.actual_subscribe(SampleNotifier(shared)));
    }
    subscription
  }
}

impl<Item, NItem, Err, S, N> ObservableExt<Item, Err> for SampleOp<S, N, NItem>
where
  S: ObservableExt<Item, Err>,
  N: ObservableExt<NItem, Err>,
{
}

impl<O, Item> SampleShared<O, Item> {
  fn terminate<Err>(self, err: Option<Err>)
  where
    O: Observer<Item, Err>,
  {
    self.latest.rc_deref_mut().take();
    match err {
      Some(err) => self.observer.error(err),
      None => self.observer.complete(),
    }
    self.subscription.unsubscribe();
  }
}

impl<Item, Err, O> Observer<Item, Err> for SampleSource<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { *self.0.latest.rc_deref_mut() = Some(value); }

  fn error(self, err: Err) { self.0.terminate(Some(err)) }

  fn complete(self) { self.0.terminate::<Err>(None) }

  fn is_closed(&self) -> bool { self.0.observer.is_closed() }
}

impl<Item, NItem, Err, O> Observer<NItem, Err> for SampleNotifier<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _: NItem) {
    let value = self.0.latest.rc_deref_mut().take();
    if let Some(value) = value {
      self.0.observer.next(value);
    }
  }

  fn error(self, err: Err) { self.0.terminate(Some(err)) }

  fn complete(self) {}

  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.0.observer) }
}

#[cfg(test)]
mod tests {
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  #[test]
  fn samples_on_each_period() {
    let scheduler = TestScheduler::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    observable::interval(Duration::from_millis(3), scheduler.clone())
      .take(6)
      .sample_time(Duration::from_millis(5), scheduler.clone())
      .subscribe(move |v| o.borrow_mut().push(v));
    scheduler.advance_by(Duration::from_millis(40));
    // values at 3, 6, 9, 12, 15, 18; samples at 5, 10, 15
    assert_eq!(*out.borrow(), vec![0, 2, 3]);
    assert_eq!(scheduler.pending_count(), 0);
  }

  #[test]
  fn notifier_drives_sampling() {
    let source = Subject::<i32, Infallible>::new();
    let notifier = Subject::<(), Infallible>::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    source.clone().sample(notifier.clone()).subscribe(move |v| o.borrow_mut().push(v));

    notifier.next(());
    source.next(1);
    source.next(2);
    notifier.next(());
    notifier.next(());
    source.next(3);
    notifier.next(());
    assert_eq!(*out.borrow(), vec![2, 3]);
    source.complete();
    assert_eq!(notifier.observer_count(), 0);
  }
}
