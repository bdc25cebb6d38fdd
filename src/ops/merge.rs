use crate::{
  observable::{Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
  subscription::{LocalSubscription, Subscription},
};

/// Interleaves the values of two streams as they arrive. Completes once both
/// complete; the first error terminates the stream and unsubscribes the
/// other side.
#[derive(Clone)]
pub struct MergeOp<S1, S2> {
  pub(crate) source_a: S1,
  pub(crate) source_b: S2,
}

/// Merge of any number of streams of the same type, see [`merge_all`].
#[derive(Clone)]
pub struct MergeAllOp<S> {
  sources: Vec<S>,
}

/// Merge every observable yielded by `sources`.
///
/// ```rust
/// use rxcore::prelude::*;
///
/// let mut out = vec![];
/// observable::merge_all(vec![observable::of(1), observable::of(2)]).subscribe(|v| out.push(v));
/// assert_eq!(out, vec![1, 2]);
/// ```
pub fn merge_all<I>(sources: I) -> MergeAllOp<I::Item>
where
  I: IntoIterator,
{
  MergeAllOp { sources: sources.into_iter().collect() }
}

pub struct MergeObserver<O> {
  observer: MutRc<Option<O>>,
  remaining: MutRc<usize>,
  subscription: LocalSubscription,
}

impl<O> Clone for MergeObserver<O> {
  fn clone(&self) -> Self {
    MergeObserver {
      observer: self.observer.clone(),
      remaining: self.remaining.clone(),
      subscription: self.subscription.clone(),
    }
  }
}

impl<O> MergeObserver<O> {
  fn new(observer: O, sources: usize) -> Self {
    MergeObserver {
      observer: MutRc::own(Some(observer)),
      remaining: MutRc::own(sources),
      subscription: LocalSubscription::default(),
    }
  }
}

impl<Item, Err, O, S1, S2> Observable<Item, Err, O> for MergeOp<S1, S2>
where
  O: Observer<Item, Err>,
  S1: Observable<Item, Err, MergeObserver<O>>,
  S1::Unsub: 'static,
  S2: Observable<Item, Err, MergeObserver<O>>,
  S2::Unsub: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    let merge = MergeObserver::new(observer, 2);
    let subscription = merge.subscription.clone();
    subscription.add(self.source_a.actual_subscribe(merge.clone()));
    if !subscription.is_closed() {
      subscription.add(self.source_b.actual_subscribe(merge));
    }
    subscription
  }
}

impl<Item, Err, S1, S2> ObservableExt<Item, Err> for MergeOp<S1, S2>
where
  S1: ObservableExt<Item, Err>,
  S2: ObservableExt<Item, Err>,
{
}

impl<Item, Err, O, S> Observable<Item, Err, O> for MergeAllOp<S>
where
  O: Observer<Item, Err>,
  S: Observable<Item, Err, MergeObserver<O>>,
  S::Unsub: 'static,
{
  type Unsub = LocalSubscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub {
    if self.sources.is_empty() {
      observer.complete();
      let subscription = LocalSubscription::default();
      subscription.clone().unsubscribe();
      return subscription;
    }
    let merge = MergeObserver::new(observer, self.sources.len());
    let subscription = merge.subscription.clone();
    for source in self.sources {
      if subscription.is_closed() {
        break;
      }
      subscription.add(source.actual_subscribe(merge.clone()));
    }
    subscription
  }
}

impl<Item, Err, S> ObservableExt<Item, Err> for MergeAllOp<S> where S: ObservableExt<Item, Err> {}

impl<Item, Err, O> Observer<Item, Err> for MergeObserver<O>
where
  O: Observer<Item, Err>,
{
  #[inline]
  fn next(&mut self, value: Item) { self.observer.next(value) }

  fn error(self, err: Err) {
    self.observer.error(err);
    self.subscription.unsubscribe();
  }

  fn complete(self) {
    let all_done = {
      let mut remaining = self.remaining.rc_deref_mut();
      *remaining = remaining.saturating_sub(1);
      *remaining == 0
    };
    if all_done {
      self.observer.complete();
      self.subscription.unsubscribe();
    }
  }

  #[inline]
  fn is_closed(&self) -> bool { Observer::<Item, Err>::is_closed(&self.observer) }
}
