//! Operator families selected at run time.
//!
//! Each family is a closed enum. A tag read from configuration is parsed
//! once, when the pipeline is built, and an unknown tag or a missing argument
//! is reported as a [`ConfigError`] right there; applying a parsed strategy
//! cannot fail. The result of `apply` is a [`BoxOp`], since the branches
//! produce different operator types; broadcasting returns a [`CloneBoxOp`]
//! so the shared stream can be handed to several subscribers.
//!
//! ```rust
//! use rxcore::prelude::*;
//! use std::{cell::RefCell, rc::Rc};
//!
//! let strategy: TakeStrategy = "last".parse().unwrap();
//! let out = Rc::new(RefCell::new(vec![]));
//! let o = out.clone();
//! strategy.apply(observable::from_iter(1..=5)).subscribe(move |v| o.borrow_mut().push(v));
//! assert_eq!(*out.borrow(), vec![5]);
//!
//! assert!("drop".parse::<TakeStrategy>().is_err());
//! ```

use crate::{
  error::ConfigError,
  observable::{BoxOp, CloneBoxOp, IntoBoxOp, IntoCloneBoxOp, ObservableExt},
  ops::{
    audit::AuditTimeOp,
    catch_error::{CatchErrorOp, FallbackObservable, FallbackValue},
    combine_latest::CombineLatestOp,
    concat::ConcatOp,
    debounce::DebounceOp,
    delay::DelayOp,
    delay_when::DelayWhenOp,
    distinct::DistinctUntilChangedOp,
    exhaust_map::ExhaustMapOp,
    filter::FilterOp,
    fork_join::ForkJoinOp,
    group_by::{GroupByOp, GroupedObservable},
    last::LastOp,
    map::{MapOp, MapToOp},
    merge::{merge_all, MergeAllOp},
    merge_map::MergeMapOp,
    pluck::Field,
    race::{race, RaceOp},
    reduce::{CountOp, ReduceOp, ToVecOp},
    retry::{RetryConfig, RetryOp},
    sample::SampleTimeOp,
    scan::ScanOp,
    share::RefCountOp,
    skip::SkipOp,
    skip_while::SkipWhileOp,
    switch_map::SwitchMapOp,
    take::TakeOp,
    take_while::TakeWhileOp,
    throttle_time::{ThrottleEdge, ThrottleTimeOp},
    zip::ZipOp,
  },
  scheduler::{Duration, Scheduler},
  subject::{BehaviorSubject, ReplaySubject, Subject},
};
use std::{fmt, str::FromStr};
use tracing::debug;

pub type Predicate<Item> = Box<dyn FnMut(&Item) -> bool>;
pub type Mapper<Item, Out> = Box<dyn FnMut(Item) -> Out>;
pub type Accumulator<Item, Acc> = Box<dyn FnMut(Acc, Item) -> Acc>;
pub type KeySelector<Item, Key> = Box<dyn FnMut(&Item) -> Key>;
/// Returns the stream whose first notification releases a held value.
pub type DurationSelector<Item, Err> = Box<dyn FnMut(&Item) -> BoxOp<(), Err>>;

fn unknown(family: &'static str, tag: &str) -> ConfigError {
  ConfigError::UnknownStrategy { family, tag: tag.to_owned() }
}

fn missing(strategy: &'static str, what: &'static str) -> ConfigError {
  ConfigError::MissingArgument { strategy, missing: what }
}

// -------------------------------------------------------------------- take

/// Take or skip values by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeStrategy {
  Take(usize),
  Skip(usize),
  First,
  Last,
}

impl TakeStrategy {
  /// Parse `tag`; `count` is used by `take` and `skip`.
  pub fn parse(tag: &str, count: usize) -> Result<Self, ConfigError> {
    match tag {
      "take" => Ok(TakeStrategy::Take(count)),
      "skip" => Ok(TakeStrategy::Skip(count)),
      "first" => Ok(TakeStrategy::First),
      "last" => Ok(TakeStrategy::Last),
      _ => Err(unknown("take", tag)),
    }
  }

  pub fn apply<S, Item, Err>(self, source: S) -> BoxOp<Item, Err>
  where
    S: ObservableExt<Item, Err>,
    TakeOp<S>: IntoBoxOp<Item, Err>,
    SkipOp<S>: IntoBoxOp<Item, Err>,
    LastOp<S>: IntoBoxOp<Item, Err>,
  {
    match self {
      TakeStrategy::Take(count) => source.take(count).into_box_op(),
      TakeStrategy::Skip(count) => source.skip(count).into_box_op(),
      TakeStrategy::First => source.first().into_box_op(),
      TakeStrategy::Last => source.last().into_box_op(),
    }
  }
}

/// Parses with a count of one.
impl FromStr for TakeStrategy {
  type Err = ConfigError;

  fn from_str(tag: &str) -> Result<Self, Self::Err> { TakeStrategy::parse(tag, 1) }
}

// -------------------------------------------------------------------- pace

/// Rate limiting over a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceStrategy {
  /// Leading-edge `throttle_time`.
  Throttle,
  Debounce,
  Audit,
  Sample,
}

impl FromStr for PaceStrategy {
  type Err = ConfigError;

  fn from_str(tag: &str) -> Result<Self, Self::Err> {
    match tag {
      "throttle" => Ok(PaceStrategy::Throttle),
      "debounce" => Ok(PaceStrategy::Debounce),
      "audit" => Ok(PaceStrategy::Audit),
      "sample" => Ok(PaceStrategy::Sample),
      _ => Err(unknown("pace", tag)),
    }
  }
}

impl PaceStrategy {
  /// A zero `duration` is rejected.
  pub fn apply<S, Sch, Item, Err>(
    self, source: S, duration: Duration, scheduler: Sch,
  ) -> Result<BoxOp<Item, Err>, ConfigError>
  where
    S: ObservableExt<Item, Err>,
    Sch: Scheduler,
    ThrottleTimeOp<S, Sch>: IntoBoxOp<Item, Err>,
    DebounceOp<S, Sch>: IntoBoxOp<Item, Err>,
    AuditTimeOp<S, Sch>: IntoBoxOp<Item, Err>,
    SampleTimeOp<S, Sch>: IntoBoxOp<Item, Err>,
  {
    if duration.is_zero() {
      return Err(ConfigError::ZeroDuration { operator: "pace" });
    }
    Ok(match self {
      PaceStrategy::Throttle => source.throttle_time(duration, ThrottleEdge::Leading, scheduler).into_box_op(),
      PaceStrategy::Debounce => source.debounce(duration, scheduler).into_box_op(),
      PaceStrategy::Audit => source.audit_time(duration, scheduler).into_box_op(),
      PaceStrategy::Sample => source.sample_time(duration, scheduler).into_box_op(),
    })
  }
}

// ------------------------------------------------------------------ switch

/// How inner streams produced by a projection are flattened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchStrategy {
  /// Only the latest inner stream is mirrored.
  Switch,
  /// Inner streams run one after another.
  Concat,
  /// Inner streams run concurrently.
  Merge,
  /// Values arriving while an inner stream runs are dropped.
  Exhaust,
}

impl FromStr for SwitchStrategy {
  type Err = ConfigError;

  fn from_str(tag: &str) -> Result<Self, Self::Err> {
    match tag {
      "switchMap" | "switch_map" => Ok(SwitchStrategy::Switch),
      "concatMap" | "concat_map" => Ok(SwitchStrategy::Concat),
      "mergeMap" | "merge_map" => Ok(SwitchStrategy::Merge),
      "exhaustMap" | "exhaust_map" => Ok(SwitchStrategy::Exhaust),
      _ => Err(unknown("switch", tag)),
    }
  }
}

impl SwitchStrategy {
  pub fn apply<S, F, Inner, Item, Out, Err>(self, source: S, project: F) -> BoxOp<Out, Err>
  where
    S: ObservableExt<Item, Err>,
    F: FnMut(Item) -> Inner,
    SwitchMapOp<S, F, Item>: IntoBoxOp<Out, Err>,
    MergeMapOp<S, F, Item>: IntoBoxOp<Out, Err>,
    ExhaustMapOp<S, F, Item>: IntoBoxOp<Out, Err>,
  {
    match self {
      SwitchStrategy::Switch => source.switch_map(project).into_box_op(),
      SwitchStrategy::Concat => source.concat_map(project).into_box_op(),
      SwitchStrategy::Merge => source.merge_map(project).into_box_op(),
      SwitchStrategy::Exhaust => source.exhaust_map(project).into_box_op(),
    }
  }
}

// ------------------------------------------------------------------- merge

/// How a source is combined with further sources of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
  Merge,
  Concat,
  Race,
}

impl FromStr for MergeStrategy {
  type Err = ConfigError;

  fn from_str(tag: &str) -> Result<Self, Self::Err> {
    match tag {
      "merge" => Ok(MergeStrategy::Merge),
      "concat" => Ok(MergeStrategy::Concat),
      "race" => Ok(MergeStrategy::Race),
      _ => Err(unknown("merge", tag)),
    }
  }
}

impl MergeStrategy {
  pub fn apply<S, I, Item, Err>(self, source: S, others: I) -> BoxOp<Item, Err>
  where
    S: ObservableExt<Item, Err> + IntoBoxOp<Item, Err>,
    I: IntoIterator<Item = S>,
    MergeAllOp<S>: IntoBoxOp<Item, Err>,
    RaceOp<S>: IntoBoxOp<Item, Err>,
    ConcatOp<BoxOp<Item, Err>, S>: IntoBoxOp<Item, Err>,
  {
    match self {
      MergeStrategy::Merge => merge_all(std::iter::once(source).chain(others)).into_box_op(),
      MergeStrategy::Race => race(std::iter::once(source).chain(others)).into_box_op(),
      MergeStrategy::Concat => {
        others.into_iter().fold(source.into_box_op(), |acc, next| acc.concat(next).into_box_op())
      }
    }
  }
}

// ----------------------------------------------------------------- recover

/// The argument a recovery tag is configured with.
pub enum RecoverArg<Item, Err> {
  Count(usize),
  CountAndDelay { count: usize, delay: Duration },
  Value(Item),
  Observable(BoxOp<Item, Err>),
}

/// What to do when the source fails.
pub enum RecoverStrategy<Item, Err> {
  /// Resubscribe immediately, at most `count` times.
  Retry(usize),
  /// Resubscribe `delay` after each failure, at most `count` times.
  RetryWithDelay { count: usize, delay: Duration },
  /// Emit the value and complete.
  FallbackValue(Item),
  /// Continue with another stream.
  FallbackObservable(BoxOp<Item, Err>),
}

impl<Item, Err> fmt::Debug for RecoverStrategy<Item, Err> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecoverStrategy::Retry(count) => f.debug_tuple("Retry").field(count).finish(),
      RecoverStrategy::RetryWithDelay { count, delay } => {
        f.debug_struct("RetryWithDelay").field("count", count).field("delay", delay).finish()
      }
      RecoverStrategy::FallbackValue(_) => f.write_str("FallbackValue"),
      RecoverStrategy::FallbackObservable(_) => f.write_str("FallbackObservable"),
    }
  }
}

impl<Item, Err> RecoverStrategy<Item, Err> {
  /// Parse `tag`, checking that `arg` is the kind of argument it needs.
  pub fn parse(tag: &str, arg: Option<RecoverArg<Item, Err>>) -> Result<Self, ConfigError> {
    match tag {
      "retry" => match arg {
        Some(RecoverArg::Count(count)) => Ok(RecoverStrategy::Retry(count)),
        _ => Err(missing("retry", "retry count")),
      },
      "retryWithDelay" | "retry_with_delay" => match arg {
        Some(RecoverArg::CountAndDelay { count, delay }) => Ok(RecoverStrategy::RetryWithDelay { count, delay }),
        _ => Err(missing("retryWithDelay", "retry count and delay")),
      },
      "fallbackValue" | "fallback_value" => match arg {
        Some(RecoverArg::Value(value)) => Ok(RecoverStrategy::FallbackValue(value)),
        _ => Err(missing("fallbackValue", "fallback value")),
      },
      "fallbackObservable" | "fallback_observable" => match arg {
        Some(RecoverArg::Observable(source)) => Ok(RecoverStrategy::FallbackObservable(source)),
        _ => Err(missing("fallbackObservable", "fallback observable")),
      },
      _ => Err(unknown("recover", tag)),
    }
  }

  /// `scheduler` times the waits of `RetryWithDelay`; the other strategies
  /// do not use it.
  pub fn apply<S, Sch>(self, source: S, scheduler: Sch) -> BoxOp<Item, Err>
  where
    S: ObservableExt<Item, Err>,
    Sch: Scheduler,
    RetryOp<S, usize>: IntoBoxOp<Item, Err>,
    RetryOp<S, RetryConfig>: IntoBoxOp<Item, Err>,
    CatchErrorOp<S, FallbackValue<Item>, Err>: IntoBoxOp<Item, Err>,
    CatchErrorOp<S, FallbackObservable<BoxOp<Item, Err>>, Err>: IntoBoxOp<Item, Err>,
  {
    debug!(strategy = ?self, "applying recovery strategy");
    match self {
      RecoverStrategy::Retry(count) => source.retry(count).into_box_op(),
      RecoverStrategy::RetryWithDelay { count, delay } => {
        source.retry_with_delay(count, delay, scheduler).into_box_op()
      }
      RecoverStrategy::FallbackValue(value) => source.fallback_value(value).into_box_op(),
      RecoverStrategy::FallbackObservable(fallback) => source.fallback_with(fallback).into_box_op(),
    }
  }
}

// ------------------------------------------------------------------ filter

/// Keep values by predicate or position.
pub enum FilterStrategy<Item> {
  Filter(Predicate<Item>),
  First,
  Last,
}

impl<Item> FilterStrategy<Item> {
  /// `predicate` is required by `filter` and ignored otherwise.
  pub fn parse(tag: &str, predicate: Option<Predicate<Item>>) -> Result<Self, ConfigError> {
    match tag {
      "filter" => predicate.map(FilterStrategy::Filter).ok_or_else(|| missing("filter", "predicate")),
      "first" => Ok(FilterStrategy::First),
      "last" => Ok(FilterStrategy::Last),
      _ => Err(unknown("filter", tag)),
    }
  }

  pub fn apply<S, Err>(self, source: S) -> BoxOp<Item, Err>
  where
    S: ObservableExt<Item, Err>,
    FilterOp<S, Predicate<Item>>: IntoBoxOp<Item, Err>,
    TakeOp<S>: IntoBoxOp<Item, Err>,
    LastOp<S>: IntoBoxOp<Item, Err>,
  {
    match self {
      FilterStrategy::Filter(predicate) => source.filter(predicate).into_box_op(),
      FilterStrategy::First => source.first().into_box_op(),
      FilterStrategy::Last => source.last().into_box_op(),
    }
  }
}

// ------------------------------------------------------------------ select

/// Select a run of values.
pub enum SelectStrategy<Item> {
  /// Drop values equal to the one before.
  Distinct,
  TakeWhile(Predicate<Item>),
  SkipWhile(Predicate<Item>),
}

impl<Item> SelectStrategy<Item> {
  /// `predicate` is required by `takeWhile` and `skipWhile`.
  pub fn parse(tag: &str, predicate: Option<Predicate<Item>>) -> Result<Self, ConfigError> {
    match tag {
      "distinct" => Ok(SelectStrategy::Distinct),
      "takeWhile" | "take_while" => {
        predicate.map(SelectStrategy::TakeWhile).ok_or_else(|| missing("takeWhile", "predicate"))
      }
      "skipWhile" | "skip_while" => {
        predicate.map(SelectStrategy::SkipWhile).ok_or_else(|| missing("skipWhile", "predicate"))
      }
      _ => Err(unknown("select", tag)),
    }
  }

  pub fn apply<S, Err>(self, source: S) -> BoxOp<Item, Err>
  where
    S: ObservableExt<Item, Err>,
    DistinctUntilChangedOp<S>: IntoBoxOp<Item, Err>,
    TakeWhileOp<S, Predicate<Item>>: IntoBoxOp<Item, Err>,
    SkipWhileOp<S, Predicate<Item>>: IntoBoxOp<Item, Err>,
  {
    match self {
      SelectStrategy::Distinct => source.distinct_until_changed().into_box_op(),
      SelectStrategy::TakeWhile(predicate) => source.take_while(predicate).into_box_op(),
      SelectStrategy::SkipWhile(predicate) => source.skip_while(predicate).into_box_op(),
    }
  }
}

// --------------------------------------------------------------- transform

/// The argument a transform tag is configured with.
pub enum TransformArg<Item, Out> {
  Func(Mapper<Item, Out>),
  Value(Out),
  /// A field lookup, built with [`TransformArg::key`].
  Key(Mapper<Item, Out>),
}

impl<Item, V> TransformArg<Item, Option<V>> {
  /// Look `key` up in every value; a missing field becomes `None`.
  pub fn key<K: 'static>(key: K) -> Self
  where
    Item: Field<K, Value = V> + 'static,
    V: 'static,
  {
    TransformArg::Key(Box::new(move |item: Item| item.field(&key)))
  }
}

/// Change every value.
pub enum TransformStrategy<Item, Out> {
  Map(Mapper<Item, Out>),
  MapTo(Out),
  Pluck(Mapper<Item, Out>),
}

impl<Item, Out> TransformStrategy<Item, Out> {
  pub fn parse(tag: &str, arg: Option<TransformArg<Item, Out>>) -> Result<Self, ConfigError> {
    match tag {
      "map" => match arg {
        Some(TransformArg::Func(func)) => Ok(TransformStrategy::Map(func)),
        _ => Err(missing("map", "mapping function")),
      },
      "mapTo" | "map_to" => match arg {
        Some(TransformArg::Value(value)) => Ok(TransformStrategy::MapTo(value)),
        _ => Err(missing("mapTo", "value")),
      },
      "pluck" => match arg {
        Some(TransformArg::Key(lookup)) => Ok(TransformStrategy::Pluck(lookup)),
        _ => Err(missing("pluck", "key")),
      },
      _ => Err(unknown("transform", tag)),
    }
  }

  pub fn apply<S, Err>(self, source: S) -> BoxOp<Out, Err>
  where
    S: ObservableExt<Item, Err>,
    Out: Clone,
    MapOp<S, Mapper<Item, Out>, Item>: IntoBoxOp<Out, Err>,
    MapToOp<S, Out, Item>: IntoBoxOp<Out, Err>,
  {
    match self {
      TransformStrategy::Map(func) | TransformStrategy::Pluck(func) => source.map(func).into_box_op(),
      TransformStrategy::MapTo(value) => source.map_to(value).into_box_op(),
    }
  }
}

// --------------------------------------------------------------- aggregate

/// The argument an aggregation tag is configured with.
pub enum AggregateArg<Item, Acc> {
  Accumulator { seed: Acc, func: Accumulator<Item, Acc> },
  /// Converts the number of values into the accumulated type.
  Tally(fn(usize) -> Acc),
}

impl<Item> AggregateArg<Item, usize> {
  pub fn tally() -> Self { AggregateArg::Tally(std::convert::identity) }
}

/// Fold the values of a stream.
pub enum AggregateStrategy<Item, Acc> {
  /// Emit every intermediate accumulation.
  Scan { seed: Acc, func: Accumulator<Item, Acc> },
  /// Emit the final accumulation on completion.
  Reduce { seed: Acc, func: Accumulator<Item, Acc> },
  /// Emit the number of values on completion.
  Count(fn(usize) -> Acc),
}

impl<Item, Acc> fmt::Debug for AggregateStrategy<Item, Acc> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      AggregateStrategy::Scan { .. } => "Scan",
      AggregateStrategy::Reduce { .. } => "Reduce",
      AggregateStrategy::Count(_) => "Count",
    })
  }
}

impl<Item, Acc> AggregateStrategy<Item, Acc> {
  pub fn parse(tag: &str, arg: Option<AggregateArg<Item, Acc>>) -> Result<Self, ConfigError> {
    match tag {
      "scan" => match arg {
        Some(AggregateArg::Accumulator { seed, func }) => Ok(AggregateStrategy::Scan { seed, func }),
        _ => Err(missing("scan", "accumulator and seed")),
      },
      "reduce" => match arg {
        Some(AggregateArg::Accumulator { seed, func }) => Ok(AggregateStrategy::Reduce { seed, func }),
        _ => Err(missing("reduce", "accumulator and seed")),
      },
      "count" => match arg {
        Some(AggregateArg::Tally(convert)) => Ok(AggregateStrategy::Count(convert)),
        _ => Err(missing("count", "count conversion")),
      },
      _ => Err(unknown("aggregate", tag)),
    }
  }

  pub fn apply<S, Err>(self, source: S) -> BoxOp<Acc, Err>
  where
    S: ObservableExt<Item, Err>,
    ScanOp<S, Accumulator<Item, Acc>, Acc, Item>: IntoBoxOp<Acc, Err>,
    ReduceOp<S, Accumulator<Item, Acc>, Acc, Item>: IntoBoxOp<Acc, Err>,
    CountOp<S, Item>: ObservableExt<usize, Err>,
    MapOp<CountOp<S, Item>, fn(usize) -> Acc, usize>: IntoBoxOp<Acc, Err>,
  {
    match self {
      AggregateStrategy::Scan { seed, func } => source.scan(seed, func).into_box_op(),
      AggregateStrategy::Reduce { seed, func } => source.reduce(seed, func).into_box_op(),
      AggregateStrategy::Count(convert) => source.count().map(convert).into_box_op(),
    }
  }
}

// ----------------------------------------------------------------- combine

/// How a source is paired with a second stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineStrategy {
  /// Pair the latest value of each side whenever either emits.
  CombineLatest,
  /// Pair values by index.
  Zip,
  /// Pair the last value of each side once both complete.
  ForkJoin,
}

impl FromStr for CombineStrategy {
  type Err = ConfigError;

  fn from_str(tag: &str) -> Result<Self, Self::Err> {
    match tag {
      "combineLatest" | "combine_latest" => Ok(CombineStrategy::CombineLatest),
      "zip" => Ok(CombineStrategy::Zip),
      "forkJoin" | "fork_join" => Ok(CombineStrategy::ForkJoin),
      _ => Err(unknown("combine", tag)),
    }
  }
}

fn pair<A, B>(a: A, b: B) -> (A, B) { (a, b) }

impl CombineStrategy {
  pub fn apply<S1, S2, A, B, Err>(self, source: S1, other: S2) -> BoxOp<(A, B), Err>
  where
    S1: ObservableExt<A, Err>,
    S2: ObservableExt<B, Err>,
    CombineLatestOp<S1, S2, fn(A, B) -> (A, B), A, B>: IntoBoxOp<(A, B), Err>,
    ZipOp<S1, S2>: IntoBoxOp<(A, B), Err>,
    ForkJoinOp<S1, S2>: IntoBoxOp<(A, B), Err>,
  {
    match self {
      CombineStrategy::CombineLatest => {
        source.combine_latest(other, pair as fn(A, B) -> (A, B)).into_box_op()
      }
      CombineStrategy::Zip => source.zip(other).into_box_op(),
      CombineStrategy::ForkJoin => source.fork_join(other).into_box_op(),
    }
  }
}

// --------------------------------------------------------------- broadcast

/// The argument a broadcast tag is configured with.
pub enum BroadcastArg<Item, Err> {
  Subject(Subject<Item, Err>),
  Initial(Item),
}

/// How one execution of a source is shared by several subscribers.
///
/// Every strategy connects with the first subscriber and disconnects when
/// the last one leaves.
pub enum BroadcastStrategy<Item, Err> {
  /// Share through the given subject.
  Multicast(Subject<Item, Err>),
  Publish,
  /// Late subscribers first receive the latest value, starting at the
  /// initial one.
  PublishBehavior(Item),
  /// Late subscribers first receive every value so far.
  PublishReplay,
  /// Each connection uses a fresh subject, so a subscriber arriving after
  /// the source terminated starts it again.
  Share,
}

impl<Item, Err> fmt::Debug for BroadcastStrategy<Item, Err> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      BroadcastStrategy::Multicast(_) => "Multicast",
      BroadcastStrategy::Publish => "Publish",
      BroadcastStrategy::PublishBehavior(_) => "PublishBehavior",
      BroadcastStrategy::PublishReplay => "PublishReplay",
      BroadcastStrategy::Share => "Share",
    })
  }
}

impl<Item, Err> BroadcastStrategy<Item, Err> {
  pub fn parse(tag: &str, arg: Option<BroadcastArg<Item, Err>>) -> Result<Self, ConfigError> {
    match tag {
      "multicast" => match arg {
        Some(BroadcastArg::Subject(subject)) => Ok(BroadcastStrategy::Multicast(subject)),
        _ => Err(missing("multicast", "subject")),
      },
      "publish" => Ok(BroadcastStrategy::Publish),
      "publishBehavior" | "publish_behavior" => match arg {
        Some(BroadcastArg::Initial(value)) => Ok(BroadcastStrategy::PublishBehavior(value)),
        _ => Err(missing("publishBehavior", "initial value")),
      },
      "publishReplay" | "publish_replay" => Ok(BroadcastStrategy::PublishReplay),
      "share" => Ok(BroadcastStrategy::Share),
      _ => Err(unknown("broadcast", tag)),
    }
  }

  pub fn apply<S>(self, source: S) -> CloneBoxOp<Item, Err>
  where
    S: ObservableExt<Item, Err>,
    RefCountOp<S, Subject<Item, Err>>: IntoCloneBoxOp<Item, Err>,
    RefCountOp<S, BehaviorSubject<Item, Err>>: IntoCloneBoxOp<Item, Err>,
    RefCountOp<S, ReplaySubject<Item, Err>>: IntoCloneBoxOp<Item, Err>,
  {
    debug!(strategy = ?self, "applying broadcast strategy");
    match self {
      BroadcastStrategy::Multicast(subject) => source.multicast(subject).ref_count().into_clone_box_op(),
      BroadcastStrategy::Publish => source.publish().ref_count().into_clone_box_op(),
      BroadcastStrategy::PublishBehavior(initial) => {
        source.publish_behavior(initial).ref_count().into_clone_box_op()
      }
      BroadcastStrategy::PublishReplay => source.publish_replay().ref_count().into_clone_box_op(),
      BroadcastStrategy::Share => source.share().into_clone_box_op(),
    }
  }
}

// ------------------------------------------------------------------- delay

/// The argument a delay tag is configured with.
pub enum DelayArg<Item, Err> {
  Duration(Duration),
  Selector(DurationSelector<Item, Err>),
}

/// Shift values in time.
pub enum DelayStrategy<Item, Err> {
  /// Every value is held for the same duration.
  Fixed(Duration),
  /// Each value is held until its selected stream notifies.
  Dynamic(DurationSelector<Item, Err>),
}

impl<Item, Err> DelayStrategy<Item, Err> {
  pub fn parse(tag: &str, arg: DelayArg<Item, Err>) -> Result<Self, ConfigError> {
    match (tag, arg) {
      ("fixed", DelayArg::Duration(delay)) => Ok(DelayStrategy::Fixed(delay)),
      ("fixed", _) => Err(missing("fixed", "duration")),
      ("dynamic", DelayArg::Selector(selector)) => Ok(DelayStrategy::Dynamic(selector)),
      ("dynamic", _) => Err(missing("dynamic", "duration selector")),
      _ => Err(unknown("delay", tag)),
    }
  }

  /// `scheduler` times the `Fixed` strategy.
  pub fn apply<S, Sch>(self, source: S, scheduler: Sch) -> BoxOp<Item, Err>
  where
    S: ObservableExt<Item, Err>,
    Sch: Scheduler,
    DelayOp<S, Sch>: IntoBoxOp<Item, Err>,
    DelayWhenOp<S, DurationSelector<Item, Err>, ()>: IntoBoxOp<Item, Err>,
  {
    match self {
      DelayStrategy::Fixed(delay) => source.delay(delay, scheduler).into_box_op(),
      DelayStrategy::Dynamic(selector) => source.delay_when(selector).into_box_op(),
    }
  }
}

// ------------------------------------------------------------------- group

type CollectGroup<Key, Item, Err> =
  fn(GroupedObservable<Key, Item, Err>) -> ToVecOp<GroupedObservable<Key, Item, Err>, Item>;

fn collect_group<Key, Item, Err>(
  group: GroupedObservable<Key, Item, Err>,
) -> ToVecOp<GroupedObservable<Key, Item, Err>, Item> {
  group.to_vec()
}

/// Split a stream into groups, emitting each group's values as one `Vec`
/// when the source completes.
pub enum GroupStrategy<Item, Key> {
  ByKey(KeySelector<Item, Key>),
}

impl<Item, Key> GroupStrategy<Item, Key> {
  pub fn parse(tag: &str, key: KeySelector<Item, Key>) -> Result<Self, ConfigError> {
    match tag {
      "byKey" | "by_key" => Ok(GroupStrategy::ByKey(key)),
      _ => Err(unknown("group", tag)),
    }
  }

  pub fn apply<S, Err>(self, source: S) -> BoxOp<Vec<Item>, Err>
  where
    S: ObservableExt<Item, Err>,
    GroupByOp<S, KeySelector<Item, Key>>: ObservableExt<GroupedObservable<Key, Item, Err>, Err>,
    MergeMapOp<GroupByOp<S, KeySelector<Item, Key>>, CollectGroup<Key, Item, Err>, GroupedObservable<Key, Item, Err>>:
      IntoBoxOp<Vec<Item>, Err>,
  {
    match self {
      GroupStrategy::ByKey(key) => {
        source.group_by(key).merge_map(collect_group as CollectGroup<Key, Item, Err>).into_box_op()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::prelude::*;
  use std::{cell::RefCell, rc::Rc};

  fn collect<Item: 'static>(source: BoxOp<Item, Infallible>) -> Vec<Item> {
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    source.subscribe(move |v| o.borrow_mut().push(v));
    let values = out.borrow_mut().drain(..).collect();
    values
  }

  fn predicate(f: impl FnMut(&i32) -> bool + 'static) -> Option<Predicate<i32>> { Some(Box::new(f)) }

  #[test]
  fn take_family_matches_the_tags() {
    let run = |tag: &str, count| collect(TakeStrategy::parse(tag, count).unwrap().apply(observable::from_iter(1..=5)));
    assert_eq!(run("take", 3), vec![1, 2, 3]);
    assert_eq!(run("skip", 2), vec![3, 4, 5]);
    assert_eq!(run("first", 0), vec![1]);
    assert_eq!(run("last", 0), vec![5]);
  }

  #[test]
  fn unknown_tags_are_rejected_at_parse_time() {
    assert_eq!(
      "drop".parse::<TakeStrategy>(),
      Err(ConfigError::UnknownStrategy { family: "take", tag: "drop".into() })
    );
    assert!("slow".parse::<PaceStrategy>().is_err());
    assert!("flatMap".parse::<SwitchStrategy>().is_err());
    assert!("zip".parse::<MergeStrategy>().is_err());
    let err = RecoverStrategy::<i32, Infallible>::parse("ignore", None).unwrap_err();
    assert_eq!(err.as_label(), "config_unknown_strategy");
  }

  #[test]
  fn pace_throttle_keeps_leading_values() {
    let scheduler = TestScheduler::new();
    let paced = "throttle"
      .parse::<PaceStrategy>()
      .unwrap()
      .apply(
        observable::interval(Duration::from_millis(1), scheduler.clone()).take(10),
        Duration::from_millis(4),
        scheduler.clone(),
      )
      .unwrap();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    paced.subscribe(move |v| o.borrow_mut().push(v));
    scheduler.advance_by(Duration::from_millis(20));
    assert_eq!(*out.borrow(), vec![0, 4, 8]);
  }

  #[test]
  fn pace_rejects_zero_duration() {
    let scheduler = TestScheduler::new();
    let result = PaceStrategy::Debounce.apply(observable::of(1), Duration::ZERO, scheduler);
    assert!(matches!(result, Err(ConfigError::ZeroDuration { .. })));
  }

  #[test]
  fn switch_family_flattens_inner_streams() {
    let strategy: SwitchStrategy = "concatMap".parse().unwrap();
    let out: Vec<i32> = collect(strategy.apply(observable::from_iter(1..=3), |v| observable::from_iter(vec![v, v * 10])));
    assert_eq!(out, vec![1, 10, 2, 20, 3, 30]);
  }

  #[test]
  fn merge_family_combines_sources() {
    let sources = || (observable::from_iter(1..=2).box_it(), vec![observable::of(3).box_it()]);
    let (source, others) = sources();
    assert_eq!(collect(MergeStrategy::Concat.apply(source, others)), vec![1, 2, 3]);
    let (source, others) = sources();
    assert_eq!(collect(MergeStrategy::Merge.apply(source, others)), vec![1, 2, 3]);
    let (source, others) = sources();
    assert_eq!(collect(MergeStrategy::Race.apply(source, others)), vec![1, 2]);
  }

  #[test]
  fn recover_fallback_value_replaces_the_error() {
    let strategy = RecoverStrategy::parse("fallbackValue", Some(RecoverArg::Value(0))).unwrap();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    strategy
      .apply(observable::throw_err::<i32, &'static str>("down"), TestScheduler::new())
      .subscribe_all(move |v| o.borrow_mut().push(v), |_| panic!("recovered"), || {});
    assert_eq!(*out.borrow(), vec![0]);
  }

  #[test]
  fn recover_retry_resubscribes() {
    let subscriptions = Rc::new(RefCell::new(0));
    let s = subscriptions.clone();
    let source = observable::create(move |emitter: Emitter<i32, &'static str>| {
      *s.borrow_mut() += 1;
      emitter.error("flaky");
    });
    let err = Rc::new(RefCell::new(None));
    let e = err.clone();
    RecoverStrategy::parse("retry", Some(RecoverArg::Count(2)))
      .unwrap()
      .apply(source, TestScheduler::new())
      .subscribe_all(|_| {}, move |v| *e.borrow_mut() = Some(v), || {});
    assert_eq!(*subscriptions.borrow(), 3);
    assert_eq!(*err.borrow(), Some("flaky"));
  }

  #[test]
  fn recover_arguments_are_checked() {
    let err = RecoverStrategy::<i32, Infallible>::parse("retryWithDelay", Some(RecoverArg::Count(3))).unwrap_err();
    assert_eq!(
      err,
      ConfigError::MissingArgument { strategy: "retryWithDelay", missing: "retry count and delay" }
    );
    assert!(RecoverStrategy::<i32, Infallible>::parse("fallbackObservable", Some(RecoverArg::Value(1))).is_err());
    assert!(RecoverStrategy::<i32, Infallible>::parse("retry", None).is_err());
  }

  #[test]
  fn filter_family_requires_a_predicate() {
    let strategy = FilterStrategy::parse("filter", predicate(|v| v % 2 == 0)).unwrap();
    assert_eq!(collect(strategy.apply(observable::from_iter(1..=6))), vec![2, 4, 6]);
    assert_eq!(collect(FilterStrategy::<i32>::parse("last", None).unwrap().apply(observable::from_iter(1..=6))), vec![6]);
    assert!(matches!(
      FilterStrategy::<i32>::parse("filter", None),
      Err(ConfigError::MissingArgument { strategy: "filter", .. })
    ));
  }

  #[test]
  fn select_family_picks_runs_of_values() {
    let source = || observable::from_iter(vec![1, 1, 2, 2, 3, 1]);
    assert_eq!(collect(SelectStrategy::parse("distinct", None).unwrap().apply(source())), vec![1, 2, 3, 1]);
    let take = SelectStrategy::parse("takeWhile", predicate(|v| *v < 3)).unwrap();
    assert_eq!(collect(take.apply(source())), vec![1, 1, 2, 2]);
    let skip = SelectStrategy::parse("skip_while", predicate(|v| *v < 2)).unwrap();
    assert_eq!(collect(skip.apply(source())), vec![2, 2, 3, 1]);
    assert!(SelectStrategy::<i32>::parse("skipWhile", None).is_err());
  }

  #[test]
  fn transform_family_maps_values() {
    let double = TransformStrategy::parse("map", Some(TransformArg::<i32, i32>::Func(Box::new(|v: i32| v * 2)))).unwrap();
    assert_eq!(collect(double.apply(observable::from_iter(1..=3))), vec![2, 4, 6]);
    let constant = TransformStrategy::<i32, &str>::parse("mapTo", Some(TransformArg::Value("x"))).unwrap();
    assert_eq!(collect(constant.apply(observable::from_iter(1..=2))), vec!["x", "x"]);
    assert!(TransformStrategy::<i32, &str>::parse("pluck", Some(TransformArg::Value("x"))).is_err());
  }

  #[test]
  fn transform_pluck_reads_a_field() {
    let person = |name: Option<&str>| {
      let mut fields = std::collections::HashMap::new();
      if let Some(name) = name {
        fields.insert("name", name.to_owned());
      }
      fields
    };
    let strategy = TransformStrategy::parse("pluck", Some(TransformArg::key("name"))).unwrap();
    let out = collect(strategy.apply(observable::from_iter(vec![person(Some("Alice")), person(None)])));
    assert_eq!(out, vec![Some("Alice".to_owned()), None]);
  }

  #[test]
  fn aggregate_family_folds_values() {
    let sum = || AggregateArg::<i32, i32>::Accumulator { seed: 0, func: Box::new(|acc: i32, v: i32| acc + v) };
    let scan = AggregateStrategy::parse("scan", Some(sum())).unwrap();
    assert_eq!(collect(scan.apply(observable::from_iter(1..=4))), vec![1, 3, 6, 10]);
    let reduce = AggregateStrategy::parse("reduce", Some(sum())).unwrap();
    assert_eq!(collect(reduce.apply(observable::from_iter(1..=4))), vec![10]);
    let count = AggregateStrategy::<i32, usize>::parse("count", Some(AggregateArg::tally())).unwrap();
    assert_eq!(collect(count.apply(observable::from_iter(1..=4))), vec![4]);
    assert_eq!(
      AggregateStrategy::<i32, i32>::parse("scan", None).unwrap_err(),
      ConfigError::MissingArgument { strategy: "scan", missing: "accumulator and seed" }
    );
  }

  #[test]
  fn combine_family_pairs_two_streams() {
    let run = |tag: &str| {
      let strategy: CombineStrategy = tag.parse().unwrap();
      let a = Subject::<i32, Infallible>::new();
      let b = Subject::<char, Infallible>::new();
      let out = Rc::new(RefCell::new(vec![]));
      let o = out.clone();
      strategy.apply(a.clone(), b.clone()).subscribe(move |v| o.borrow_mut().push(v));
      a.next(1);
      a.next(2);
      b.next('x');
      b.next('y');
      a.emit_complete();
      b.emit_complete();
      let values: Vec<(i32, char)> = out.borrow().clone();
      values
    };
    assert_eq!(run("combineLatest"), vec![(2, 'x'), (2, 'y')]);
    assert_eq!(run("zip"), vec![(1, 'x'), (2, 'y')]);
    assert_eq!(run("forkJoin"), vec![(2, 'y')]);
    assert!("merge".parse::<CombineStrategy>().is_err());
  }

  #[test]
  fn broadcast_replay_catches_up_late_subscribers() {
    let source = Subject::<i32, Infallible>::new();
    let shared = BroadcastStrategy::parse("publishReplay", None).unwrap().apply(source.clone());
    let (early, late) = (Rc::new(RefCell::new(vec![])), Rc::new(RefCell::new(vec![])));
    let (e, l) = (early.clone(), late.clone());
    shared.clone().subscribe(move |v| e.borrow_mut().push(v));
    assert_eq!(source.observer_count(), 1);
    source.next(1);
    source.next(2);
    shared.subscribe(move |v| l.borrow_mut().push(v));
    source.next(3);
    assert_eq!(*early.borrow(), vec![1, 2, 3]);
    assert_eq!(*late.borrow(), vec![1, 2, 3]);
  }

  #[test]
  fn broadcast_behavior_starts_with_the_initial_value() {
    let source = Subject::<i32, Infallible>::new();
    let shared =
      BroadcastStrategy::parse("publishBehavior", Some(BroadcastArg::Initial(0))).unwrap().apply(source.clone());
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    let subscription = shared.subscribe(move |v| o.borrow_mut().push(v));
    source.next(7);
    subscription.unsubscribe();
    assert_eq!(source.observer_count(), 0);
    assert_eq!(*out.borrow(), vec![0, 7]);
    assert!(BroadcastStrategy::<i32, Infallible>::parse("multicast", None).is_err());
  }

  #[test]
  fn delay_family_holds_values() {
    let scheduler = TestScheduler::new();
    let out = Rc::new(RefCell::new(vec![]));
    let o = out.clone();
    DelayStrategy::parse("fixed", DelayArg::Duration(Duration::from_millis(5)))
      .unwrap()
      .apply(observable::of(1), scheduler.clone())
      .subscribe(move |v| o.borrow_mut().push(v));
    scheduler.advance_by(Duration::from_millis(4));
    assert!(out.borrow().is_empty());
    scheduler.advance_by(Duration::from_millis(1));
    assert_eq!(*out.borrow(), vec![1]);

    let s = scheduler.clone();
    let selector: DurationSelector<u64, Infallible> =
      Box::new(move |ms: &u64| observable::timer(Duration::from_millis(*ms), s.clone()).box_it());
    let o = out.clone();
    DelayStrategy::parse("dynamic", DelayArg::Selector(selector))
      .unwrap()
      .apply(observable::from_iter([20u64, 10]), scheduler.clone())
      .subscribe(move |v| o.borrow_mut().push(v as i32));
    scheduler.advance_by(Duration::from_millis(20));
    assert_eq!(*out.borrow(), vec![1, 10, 20]);
    let selector: DurationSelector<i32, Infallible> = Box::new(|_: &i32| observable::empty().box_it());
    assert!(DelayStrategy::parse("fixed", DelayArg::Selector(selector)).is_err());
  }

  #[test]
  fn group_family_collects_each_key() {
    let strategy = GroupStrategy::<i32, i32>::parse("byKey", Box::new(|v: &i32| v % 2)).unwrap();
    let mut groups = collect(strategy.apply(observable::from_iter(1..=6)));
    groups.sort();
    assert_eq!(groups, vec![vec![1, 3, 5], vec![2, 4, 6]]);
    assert!(GroupStrategy::<i32, i32>::parse("byValue", Box::new(|v: &i32| *v)).is_err());
  }
}
