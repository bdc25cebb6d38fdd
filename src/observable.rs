//! Observables and the operator surface.
//!
//! An observable is a plain value describing how to produce a sequence.
//! Nothing happens until it is subscribed; subscribing consumes the value, so
//! re-subscription is done on a clone, and every subscription runs its own
//! execution.

use crate::{
  error::ConfigError,
  observer::{AllObserver, BoxedObserver, FnMutObserver},
  ops::{
    audit::AuditTimeOp,
    catch_error::{CatchErrorOp, FallbackObservable, FallbackValue, RecoverWith},
    combine_latest::CombineLatestOp,
    concat::ConcatOp,
    debounce::DebounceOp,
    delay::DelayOp,
    delay_when::DelayWhenOp,
    distinct::{DistinctOp, DistinctUntilChangedOp},
    exhaust_map::ExhaustMapOp,
    expand::ExpandOp,
    filter::FilterOp,
    first::FirstOrOp,
    fork_join::ForkJoinOp,
    group_by::GroupByOp,
    last::{LastOp, LastOrOp},
    lifecycle::{OnCompleteOp, OnErrorOp, TapOp},
    map::{MapOp, MapToOp},
    map_err::MapErrOp,
    merge::MergeOp,
    merge_map::MergeMapOp,
    pluck::{PluckOp, PluckStrictOp},
    race::RaceOp,
    reduce::{CountOp, ReduceOp, ToVecOp},
    retry::{RetryConfig, RetryOp, RetryPolicy},
    sample::{SampleOp, SampleTimeOp},
    scan::ScanOp,
    share::ShareOp,
    skip::SkipOp,
    skip_while::SkipWhileOp,
    switch_map::SwitchMapOp,
    take::TakeOp,
    take_while::TakeWhileOp,
    throttle_time::{ThrottleEdge, ThrottleTimeOp},
    try_map::TryMapOp,
    zip::ZipOp,
  },
  scheduler::{Duration, Scheduler},
  subject::{BehaviorSubject, ReplaySubject, Subject},
  subscription::Subscription,
  type_hint::TypeHint,
};

mod boxed;
mod connectable;
mod create;
mod defer;
mod from_future;
mod from_iter;
mod from_stream;
mod of;
mod timer;
pub use boxed::*;
pub use connectable::*;
pub use create::*;
pub use defer::*;
pub use from_future::*;
pub use from_iter::*;
pub use from_stream::*;
pub use of::*;
pub use timer::*;
pub use crate::ops::{merge::merge_all, race::race};

/// A source of `Item`s (or one `Err`) that can be subscribed by an observer
/// of type `O`.
///
/// Operators implement it for every observer their wrapped source accepts,
/// so type information flows end to end and the whole chain compiles to
/// nested structs.
pub trait Observable<Item, Err, O> {
  type Unsub: Subscription;

  fn actual_subscribe(self, observer: O) -> Self::Unsub;
}

/// Operator and subscription methods, available on every observable.
pub trait ObservableExt<Item, Err>: Sized {
  /// Subscribe with a `next` closure. Only available on streams that cannot
  /// fail; handle errors first with `on_error`, or use `subscribe_all`.
  fn subscribe<N>(self, next: N) -> <Self as Observable<Item, Err, FnMutObserver<N>>>::Unsub
  where
    N: FnMut(Item),
    Self: Observable<Item, Err, FnMutObserver<N>>,
  {
    self.actual_subscribe(FnMutObserver(next))
  }

  fn subscribe_all<N, E, C>(
    self, next: N, error: E, complete: C,
  ) -> <Self as Observable<Item, Err, AllObserver<N, E, C>>>::Unsub
  where
    N: FnMut(Item),
    E: FnOnce(Err),
    C: FnOnce(),
    Self: Observable<Item, Err, AllObserver<N, E, C>>,
  {
    self.actual_subscribe(AllObserver { next, error, complete })
  }

  fn subscribe_with<O>(self, observer: O) -> <Self as Observable<Item, Err, O>>::Unsub
  where
    Self: Observable<Item, Err, O>,
  {
    self.actual_subscribe(observer)
  }

  /// Erase the concrete type of this observable.
  fn box_it(self) -> BoxOp<Item, Err>
  where
    Self: Observable<Item, Err, BoxedObserver<Item, Err>> + 'static,
    <Self as Observable<Item, Err, BoxedObserver<Item, Err>>>::Unsub: 'static,
  {
    BoxOp::new(self)
  }

  /// Erase the concrete type, keeping the ability to clone.
  fn clone_box_it(self) -> CloneBoxOp<Item, Err>
  where
    Self: Observable<Item, Err, BoxedObserver<Item, Err>> + Clone + 'static,
    <Self as Observable<Item, Err, BoxedObserver<Item, Err>>>::Unsub: 'static,
  {
    CloneBoxOp::new(self)
  }

  // ---------------------------------------------------------------- transform

  /// Creates a new stream which calls a closure on each element and uses its
  /// return as the value.
  fn map<B, F>(self, func: F) -> MapOp<Self, F, Item>
  where
    F: FnMut(Item) -> B,
  {
    MapOp { source: self, func, _hint: TypeHint::new() }
  }

  /// Replace every value with a clone of `value`.
  fn map_to<B: Clone>(self, value: B) -> MapToOp<Self, B, Item> {
    MapToOp { source: self, value, _hint: TypeHint::new() }
  }

  /// Map with a fallible function; the first `Err` terminates the stream.
  fn try_map<B, F>(self, func: F) -> TryMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Result<B, Err>,
  {
    TryMapOp { source: self, func, _hint: TypeHint::new() }
  }

  fn map_err<E2, F>(self, func: F) -> MapErrOp<Self, F, Err>
  where
    F: FnOnce(Err) -> E2,
  {
    MapErrOp { source: self, func, _hint: TypeHint::new() }
  }

  /// Look up `key` in every map-like value, emitting `Some(value)` or `None`
  /// when the key is absent.
  fn pluck<K>(self, key: K) -> PluckOp<Self, K, Item> {
    PluckOp { source: self, key, _hint: TypeHint::new() }
  }

  /// Like `pluck`, but a missing key terminates the stream with the error
  /// built by `on_missing`.
  fn pluck_strict<K, F>(self, key: K, on_missing: F) -> PluckStrictOp<Self, K, F, Item>
  where
    F: FnMut(&K) -> Err,
  {
    PluckStrictOp { source: self, key, on_missing, _hint: TypeHint::new() }
  }

  // ------------------------------------------------------------------ filter

  /// Emit only those items that pass a predicate test.
  fn filter<F>(self, predicate: F) -> FilterOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    FilterOp { source: self, predicate }
  }

  /// Emit only the first `count` values, then complete and unsubscribe the
  /// source right away. `take(0)` completes without subscribing the source.
  fn take(self, count: usize) -> TakeOp<Self> { TakeOp { source: self, count } }

  /// Emit the first value, then complete. Completes without a value on an
  /// empty source.
  fn first(self) -> TakeOp<Self> { self.take(1) }

  /// Emit the first value, or `default` if the source completes empty.
  fn first_or(self, default: Item) -> FirstOrOp<Self, Item> { FirstOrOp { source: self, default } }

  /// Emit only the final value, on completion.
  fn last(self) -> LastOp<Self> { LastOp { source: self } }

  fn last_or(self, default: Item) -> LastOrOp<Self, Item> { LastOrOp { source: self, default } }

  fn skip(self, count: usize) -> SkipOp<Self> { SkipOp { source: self, count } }

  /// Emit values while `predicate` holds; complete on the first value that
  /// fails it, without emitting that value.
  fn take_while<F>(self, predicate: F) -> TakeWhileOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    TakeWhileOp { source: self, predicate, inclusive: false }
  }

  /// Like `take_while`, but also emit the value that failed the predicate.
  fn take_while_inclusive<F>(self, predicate: F) -> TakeWhileOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    TakeWhileOp { source: self, predicate, inclusive: true }
  }

  fn skip_while<F>(self, predicate: F) -> SkipWhileOp<Self, F>
  where
    F: FnMut(&Item) -> bool,
  {
    SkipWhileOp { source: self, predicate }
  }

  /// Emit values never seen before in this subscription.
  fn distinct(self) -> DistinctOp<Self> { DistinctOp { source: self } }

  /// Drop values equal to the one just emitted.
  fn distinct_until_changed(self) -> DistinctUntilChangedOp<Self> {
    DistinctUntilChangedOp { source: self }
  }

  // --------------------------------------------------------------- aggregate

  /// Emit every intermediate accumulation.
  fn scan<B, F>(self, seed: B, func: F) -> ScanOp<Self, F, B, Item>
  where
    F: FnMut(B, Item) -> B,
  {
    ScanOp { source: self, func, seed, _hint: TypeHint::new() }
  }

  /// Emit the final accumulation on completion (`seed` for an empty source).
  fn reduce<B, F>(self, seed: B, func: F) -> ReduceOp<Self, F, B, Item>
  where
    F: FnMut(B, Item) -> B,
  {
    ReduceOp { source: self, func, seed, _hint: TypeHint::new() }
  }

  fn count(self) -> CountOp<Self, Item> {
    fn step<Item>(acc: usize, _: Item) -> usize { acc + 1 }
    self.reduce(0, step as fn(usize, Item) -> usize)
  }

  /// Collect every value into a `Vec`, emitted on completion.
  fn to_vec(self) -> ToVecOp<Self, Item> {
    fn push<Item>(mut acc: Vec<Item>, v: Item) -> Vec<Item> {
      acc.push(v);
      acc
    }
    self.reduce(Vec::new(), push as fn(Vec<Item>, Item) -> Vec<Item>)
  }

  // ----------------------------------------------------------------- combine

  /// Whenever either stream emits, and both have emitted at least once, emit
  /// `func(latest_self, latest_other)`.
  fn combine_latest<S2, B, F, Out>(self, other: S2, func: F) -> CombineLatestOp<Self, S2, F, Item, B>
  where
    S2: ObservableExt<B, Err>,
    F: FnMut(Item, B) -> Out,
  {
    CombineLatestOp { source_a: self, source_b: other, func, _hint: TypeHint::new() }
  }

  /// Pair values by index.
  fn zip<S2>(self, other: S2) -> ZipOp<Self, S2> { ZipOp { source_a: self, source_b: other } }

  /// Interleave both streams; complete when both complete.
  fn merge<S2>(self, other: S2) -> MergeOp<Self, S2>
  where
    S2: ObservableExt<Item, Err>,
  {
    MergeOp { source_a: self, source_b: other }
  }

  /// Emit all of `self`, then all of `other`.
  fn concat<S2>(self, other: S2) -> ConcatOp<Self, S2>
  where
    S2: ObservableExt<Item, Err>,
  {
    ConcatOp { first: self, second: other }
  }

  /// Wait for both streams to complete and emit their final values as one
  /// tuple. A source completing without a value fails with `EmptyError`.
  fn fork_join<S2>(self, other: S2) -> ForkJoinOp<Self, S2> { ForkJoinOp { source_a: self, source_b: other } }

  /// Mirror whichever of the two streams notifies first.
  fn race_with(self, other: Self) -> RaceOp<Self> { RaceOp { sources: vec![self, other] } }

  // ------------------------------------------------------------------ switch

  /// Project each value to an inner stream and mirror only the most recent
  /// one, unsubscribing the previous inner stream.
  fn switch_map<F, Inner>(self, func: F) -> SwitchMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Inner,
  {
    SwitchMapOp { source: self, func, _hint: TypeHint::new() }
  }

  /// Project each value to an inner stream and mirror all of them
  /// concurrently.
  fn merge_map<F, Inner>(self, func: F) -> MergeMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Inner,
  {
    MergeMapOp { source: self, func, concurrency: usize::MAX, _hint: TypeHint::new() }
  }

  /// Alias of `merge_map`.
  fn flat_map<F, Inner>(self, func: F) -> MergeMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Inner,
  {
    self.merge_map(func)
  }

  /// `merge_map` with at most `concurrent` active inner streams; further
  /// values wait in arrival order.
  fn merge_map_with_concurrency<F, Inner>(
    self, func: F, concurrent: usize,
  ) -> Result<MergeMapOp<Self, F, Item>, ConfigError>
  where
    F: FnMut(Item) -> Inner,
  {
    if concurrent == 0 {
      return Err(ConfigError::ZeroCount { operator: "merge_map_with_concurrency" });
    }
    Ok(MergeMapOp { source: self, func, concurrency: concurrent, _hint: TypeHint::new() })
  }

  /// Project each value to an inner stream and run them one after another.
  fn concat_map<F, Inner>(self, func: F) -> MergeMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Inner,
  {
    MergeMapOp { source: self, func, concurrency: 1, _hint: TypeHint::new() }
  }

  /// Project a value to an inner stream only while no other inner stream is
  /// active; values arriving meanwhile are dropped.
  fn exhaust_map<F, Inner>(self, func: F) -> ExhaustMapOp<Self, F, Item>
  where
    F: FnMut(Item) -> Inner,
  {
    ExhaustMapOp { source: self, func, _hint: TypeHint::new() }
  }

  /// Emit every value and recursively feed it to `func`, merging the
  /// resulting streams back into the output.
  fn expand<F, Inner>(self, func: F) -> ExpandOp<Self, F>
  where
    F: FnMut(&Item) -> Inner,
  {
    ExpandOp { source: self, func }
  }

  /// Split the stream into one hot `GroupedObservable` per key.
  fn group_by<F, Key>(self, key: F) -> GroupByOp<Self, F>
  where
    F: FnMut(&Item) -> Key,
  {
    GroupByOp { source: self, key }
  }

  // -------------------------------------------------------------------- pace

  /// Emit a value, then ignore values for `duration`. With
  /// `ThrottleEdge::Trailing` the last value of each window is emitted when
  /// the window closes instead.
  fn throttle_time<Sch: Scheduler>(
    self, duration: Duration, edge: ThrottleEdge, scheduler: Sch,
  ) -> ThrottleTimeOp<Self, Sch> {
    ThrottleTimeOp { source: self, duration, edge, scheduler }
  }

  /// Emit a value only after `duration` passed without another value.
  fn debounce<Sch: Scheduler>(self, duration: Duration, scheduler: Sch) -> DebounceOp<Self, Sch> {
    DebounceOp { source: self, duration, scheduler }
  }

  /// On a value, wait `duration`, then emit the most recent value.
  fn audit_time<Sch: Scheduler>(self, duration: Duration, scheduler: Sch) -> AuditTimeOp<Self, Sch> {
    AuditTimeOp { source: self, duration, scheduler }
  }

  /// Every `period`, emit the most recent value if a new one arrived.
  fn sample_time<Sch: Scheduler>(self, period: Duration, scheduler: Sch) -> SampleTimeOp<Self, Sch> {
    SampleTimeOp { source: self, period, scheduler }
  }

  /// Whenever `notifier` emits, emit the most recent value if a new one
  /// arrived.
  fn sample<N, NItem>(self, notifier: N) -> SampleOp<Self, N, NItem>
  where
    N: ObservableExt<NItem, Err>,
  {
    SampleOp { source: self, notifier, _hint: TypeHint::new() }
  }

  /// Shift every value, and completion, later by `delay`.
  fn delay<Sch: Scheduler>(self, delay: Duration, scheduler: Sch) -> DelayOp<Self, Sch> {
    DelayOp { source: self, delay, scheduler }
  }

  /// Hold each value until the stream returned by `func` for it emits or
  /// completes.
  fn delay_when<F, D, DItem>(self, func: F) -> DelayWhenOp<Self, F, DItem>
  where
    F: FnMut(&Item) -> D,
    D: ObservableExt<DItem, Err>,
  {
    DelayWhenOp { source: self, func, _hint: TypeHint::new() }
  }

  // ----------------------------------------------------------------- recover

  /// Resubscribe to the source after an error, as allowed by `policy`. A
  /// `usize` policy is the number of extra attempts. Delays in the policy are
  /// ignored here; use `retry_when` to honour them.
  fn retry<P: RetryPolicy<Err>>(self, policy: P) -> RetryOp<Self, P> { RetryOp::immediate(self, policy) }

  /// Resubscribe after an error, waiting on `scheduler` for the delay the
  /// policy returns.
  fn retry_when<P, Sch>(self, policy: P, scheduler: Sch) -> RetryOp<Self, P>
  where
    P: RetryPolicy<Err>,
    Sch: Scheduler,
  {
    RetryOp::delayed(self, policy, scheduler)
  }

  /// Up to `count` extra attempts, each started `delay` after the failure.
  fn retry_with_delay<Sch: Scheduler>(
    self, count: usize, delay: Duration, scheduler: Sch,
  ) -> RetryOp<Self, RetryConfig> {
    self.retry_when(RetryConfig::new().count(count).delay(delay), scheduler)
  }

  /// On error, continue with the stream returned by `func`.
  fn catch_error<F, S2>(self, func: F) -> CatchErrorOp<Self, RecoverWith<F>, Err>
  where
    F: FnOnce(Err) -> S2,
  {
    CatchErrorOp { source: self, recovery: RecoverWith(func), _hint: TypeHint::new() }
  }

  /// On error, emit `value` and complete.
  fn fallback_value(self, value: Item) -> CatchErrorOp<Self, FallbackValue<Item>, Err> {
    CatchErrorOp { source: self, recovery: FallbackValue(value), _hint: TypeHint::new() }
  }

  /// On error, continue with `fallback`.
  fn fallback_with<S2>(self, fallback: S2) -> CatchErrorOp<Self, FallbackObservable<S2>, Err> {
    CatchErrorOp { source: self, recovery: FallbackObservable(fallback), _hint: TypeHint::new() }
  }

  // --------------------------------------------------------------- lifecycle

  /// Handle the error with `func`; the resulting stream cannot fail.
  fn on_error<F>(self, func: F) -> OnErrorOp<Self, F, Err>
  where
    F: FnOnce(Err),
  {
    OnErrorOp { source: self, func, _hint: TypeHint::new() }
  }

  fn on_complete<F>(self, func: F) -> OnCompleteOp<Self, F>
  where
    F: FnOnce(),
  {
    OnCompleteOp { source: self, func }
  }

  /// Observe each value by reference without changing the stream.
  fn tap<F>(self, func: F) -> TapOp<Self, F>
  where
    F: FnMut(&Item),
  {
    TapOp { source: self, func }
  }

  // --------------------------------------------------------------- multicast

  /// Share one execution of this source through `subject`, started by
  /// `connect`.
  fn multicast<Sub>(self, subject: Sub) -> ConnectableObservable<Self, Sub> {
    ConnectableObservable::new(self, subject)
  }

  fn publish(self) -> ConnectableObservable<Self, Subject<Item, Err>> { self.multicast(Subject::new()) }

  fn publish_behavior(self, initial: Item) -> ConnectableObservable<Self, BehaviorSubject<Item, Err>> {
    self.multicast(BehaviorSubject::new(initial))
  }

  fn publish_replay(self) -> ConnectableObservable<Self, ReplaySubject<Item, Err>> {
    self.multicast(ReplaySubject::new())
  }

  /// Multicast through a fresh subject per connection, connecting on the
  /// first subscriber and tearing the source down when the last one leaves.
  fn share(self) -> ShareOp<Self, Item, Err> { ShareOp::new(self) }
}
